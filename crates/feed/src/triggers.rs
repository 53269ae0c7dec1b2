// Archivo: triggers.rs
// Propósito: multiplexar las fuentes de disparo de carga (centinela de
// proximidad, sonda de scroll y sonda de viewport corto) sobre la misma
// puerta single-flight de `FeedEngine::load_more`.
//
// Las fuentes no se coordinan entre sí: un disparo redundante termina en
// `LoadOutcome::Skipped` dentro del motor.
use crate::domain::{LoadOutcome, SessionId};
use crate::engine::FeedEngine;
use crate::repository::{PageFetcher, Viewport, ViewportMetrics};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Fuente de un disparo, sólo para trazas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Proximity,
    ScrollProbe,
    ShortViewport,
}

/// Por qué un disparo no llegó al motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// El token pertenece a una sesión anterior a un `reset`.
    StaleSession,
    /// El centinela o el final del documento están fuera del margen.
    OutOfRange,
    /// Comprobación de scroll dentro de la ventana de throttle.
    Throttled,
    /// Se agotaron las cargas consecutivas de la sonda de viewport corto.
    AttemptsExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Fired(LoadOutcome),
    Ignored(IgnoreReason),
}

impl TriggerOutcome {
    pub fn loaded(&self) -> bool {
        matches!(self, Self::Fired(outcome) if outcome.is_loaded())
    }
}

#[derive(Debug, Default)]
struct TriggerState {
    session: SessionId,
    last_scroll_check: Option<Instant>,
    fill_attempts: u32,
}

/// Punto de entrada de todos los disparadores de carga de una lista.
pub struct TriggerHub<F>
    where F: PageFetcher
{
    engine: Arc<FeedEngine<F>>,
    viewport: Arc<dyn Viewport>,
    state: Mutex<TriggerState>,
}

impl<F> TriggerHub<F> where F: PageFetcher
{
    pub fn new(engine: Arc<FeedEngine<F>>, viewport: Arc<dyn Viewport>) -> Self {
        let session = engine.session();
        Self { engine,
               viewport,
               state: Mutex::new(TriggerState { session, ..Default::default() }) }
    }

    fn lock(&self) -> MutexGuard<'_, TriggerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Toma la sesión actual del motor y descarta el estado acumulado
    /// (throttle y cargas consecutivas). Devuelve el token que deben llevar
    /// los disparos.
    pub fn arm(&self) -> SessionId {
        let session = self.engine.session();
        *self.lock() = TriggerState { session, ..Default::default() };
        log::debug!("disparadores armados para la sesión {}", session.0);
        session
    }

    fn is_stale(&self, token: SessionId) -> bool {
        token != self.engine.session() || token != self.lock().session
    }

    async fn fire(&self, source: TriggerSource, token: SessionId) -> TriggerOutcome {
        if self.is_stale(token) {
            log::debug!("disparo {:?} de una sesión anterior ignorado", source);
            return TriggerOutcome::Ignored(IgnoreReason::StaleSession);
        }
        let outcome = self.engine.load_more().await;
        log::debug!("disparo {:?}: {:?}", source, outcome);
        TriggerOutcome::Fired(outcome)
    }

    /// Centinela de proximidad: `distance_px` es la distancia entre el borde
    /// del área visible y el centinela situado tras el último item.
    pub async fn on_sentinel(&self, token: SessionId, distance_px: f64) -> TriggerOutcome {
        if distance_px > self.engine.config().proximity_margin_px {
            return TriggerOutcome::Ignored(IgnoreReason::OutOfRange);
        }
        let outcome = self.fire(TriggerSource::Proximity, token).await;
        if outcome.loaded() {
            self.restart_fill(token).await;
        }
        outcome
    }

    /// Sonda de scroll con throttle. Cubre los scrolls rápidos que el
    /// centinela puede no ver.
    pub async fn on_scroll(&self, token: SessionId, metrics: ViewportMetrics, now: Instant) -> TriggerOutcome {
        {
            let mut st = self.lock();
            if let Some(last) = st.last_scroll_check {
                if now.saturating_duration_since(last) < self.engine.config().scroll_throttle {
                    return TriggerOutcome::Ignored(IgnoreReason::Throttled);
                }
            }
            st.last_scroll_check = Some(now);
        }
        if metrics.distance_to_bottom() > self.engine.config().scroll_threshold_px {
            return TriggerOutcome::Ignored(IgnoreReason::OutOfRange);
        }
        let outcome = self.fire(TriggerSource::ScrollProbe, token).await;
        if outcome.loaded() {
            self.restart_fill(token).await;
        }
        outcome
    }

    /// Sonda de viewport corto: mientras el contenido no llene el viewport y
    /// queden páginas, pide otra. Acotada por `max_fill_attempts` cargas
    /// consecutivas. Devuelve cuántas páginas se cargaron.
    pub async fn fill_viewport(&self, token: SessionId) -> u32 {
        let mut loaded = 0;
        loop {
            if self.is_stale(token) {
                break;
            }
            let metrics = self.viewport.metrics();
            if !metrics.is_short() || !self.engine.state().has_more() {
                self.lock().fill_attempts = 0;
                break;
            }
            {
                let mut st = self.lock();
                if st.fill_attempts >= self.engine.config().max_fill_attempts {
                    log::debug!("viewport corto tras {} cargas consecutivas, se deja de insistir", st.fill_attempts);
                    break;
                }
                st.fill_attempts += 1;
            }
            match self.fire(TriggerSource::ShortViewport, token).await {
                TriggerOutcome::Fired(LoadOutcome::Loaded { .. }) => loaded += 1,
                _ => break,
            }
        }
        loaded
    }

    /// Una carga del centinela o del scroll corta la racha de la sonda de
    /// viewport corto: sus intentos dejan de ser consecutivos.
    async fn restart_fill(&self, token: SessionId) {
        self.lock().fill_attempts = 0;
        self.fill_viewport(token).await;
    }

    /// Versión periódica de la sonda de scroll. Termina cuando la sesión del
    /// token queda obsoleta o no quedan páginas.
    pub async fn run_scroll_probe(&self, token: SessionId) {
        let mut ticker = tokio::time::interval(self.engine.config().scroll_probe_period);
        loop {
            ticker.tick().await;
            if self.is_stale(token) || !self.engine.state().has_more() {
                log::debug!("sonda de scroll detenida");
                return;
            }
            let metrics = self.viewport.metrics();
            self.on_scroll(token, metrics, Instant::now()).await;
        }
    }

    /// Estado de la sonda de viewport corto, para inspección.
    pub fn fill_attempts(&self) -> u32 {
        self.lock().fill_attempts
    }
}
