// Archivo: repository.rs
// Propósito: definir los contratos con los colaboradores externos: el
// endpoint de datos (`PageFetcher`, `ItemCreator`), el sink de render, el
// efecto del ancla y las métricas del viewport.
use crate::domain::{Cursor, Item, LoadPhase, Page};
use crate::errors::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Emite una petición paginada. `cursor == None` pide el inicio de la
/// colección.
///
/// Cualquier fallo (red, estado no exitoso, cuerpo malformado) se devuelve
/// como `Err`; el motor los trata de la misma forma.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, cursor: Option<&Cursor>, limit: u32) -> Result<Page>;
}

/// Crea un item en el servidor. Algunos endpoints sólo devuelven un recibo,
/// por eso el item es opcional.
#[async_trait]
pub trait ItemCreator: Send + Sync {
    async fn create_item(&self, content: &str) -> Result<Option<Item>>;
}

/// Destino del render. Cada nodo está indexado por `Item::id`; volver a
/// añadir un id existente no debe duplicarlo.
pub trait RenderSink: Send + Sync {
    /// Sustituye todo el contenido renderizado.
    fn replace(&self, items: &[Item]);
    /// Añade al final, en el orden recibido.
    fn append(&self, items: &[Item]);
    /// Vacía la vista.
    fn clear(&self);
    /// Muestra un fallo de carga. Por defecto no hace nada.
    fn show_error(&self, _phase: LoadPhase, _message: &str) {}
}

/// Efecto visible del ancla: llevar el nodo a la vista y resaltarlo durante
/// `highlight`. Devuelve `false` si el nodo no existe.
pub trait AnchorEffect: Send + Sync {
    fn reveal(&self, id: &str, highlight: Duration) -> bool;
}

/// Medidas del área de scroll, en píxeles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl ViewportMetrics {
    /// Distancia entre el borde inferior visible y el final del contenido.
    pub fn distance_to_bottom(&self) -> f64 {
        (self.content_height - (self.scroll_top + self.viewport_height)).max(0.0)
    }

    /// `true` si el contenido es más bajo que el viewport. Un contenido que
    /// lo llena exactamente no cuenta como corto.
    pub fn is_short(&self) -> bool {
        self.content_height < self.viewport_height
    }
}

pub trait Viewport: Send + Sync {
    fn metrics(&self) -> ViewportMetrics;
}
