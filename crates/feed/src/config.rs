// Archivo: config.rs
// Propósito: constantes ajustables del motor, los disparadores y el ancla.
use std::time::Duration;

/// Límite mínimo y máximo de items por página que acepta el endpoint.
pub const MIN_PAGE_LIMIT: u32 = 1;
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Configuración del feed. Ninguno de estos valores es contractual: son
/// márgenes y cotas que pueden ajustarse por lista.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEngineConfig {
    /// Items pedidos por página (`limit`).
    pub page_limit: u32,
    /// Margen en píxeles por delante del área visible en el que el centinela
    /// dispara la siguiente carga.
    pub proximity_margin_px: f64,
    /// Distancia al final del documento por debajo de la cual la sonda de
    /// scroll pide más.
    pub scroll_threshold_px: f64,
    /// Separación mínima entre dos comprobaciones de scroll.
    pub scroll_throttle: Duration,
    /// Periodo de la sonda de scroll periódica.
    pub scroll_probe_period: Duration,
    /// Cargas consecutivas permitidas mientras el contenido sea más corto
    /// que el viewport.
    pub max_fill_attempts: u32,
    /// Páginas extra que el ancla puede pedir antes de rendirse.
    pub anchor_max_pages: u32,
    /// Duración del resaltado del item anclado.
    pub highlight: Duration,
}

impl FeedEngineConfig {
    /// Fija `page_limit` acotado a `MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT`.
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.clamp(MIN_PAGE_LIMIT, MAX_PAGE_LIMIT);
        self
    }
}

impl Default for FeedEngineConfig {
    fn default() -> Self {
        Self { page_limit: 10,
               proximity_margin_px: 600.0,
               scroll_threshold_px: 400.0,
               scroll_throttle: Duration::from_millis(200),
               scroll_probe_period: Duration::from_millis(500),
               max_fill_attempts: 3,
               anchor_max_pages: 10,
               highlight: Duration::from_secs(3) }
    }
}
