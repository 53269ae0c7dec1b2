// Archivo: anchor.rs
// Propósito: resolver un enlace profundo (ancla) a un item que puede no
// estar cargado todavía, pidiendo páginas hasta encontrarlo o agotar el
// límite de reintentos.
use crate::config::FeedEngineConfig;
use crate::domain::SessionId;
use crate::engine::FeedEngine;
use crate::repository::{AnchorEffect, PageFetcher};
use std::time::Duration;

/// Estados del resolutor: `Idle → Searching → {Found, Exhausted}`.
///
/// `fetches` cuenta las páginas que el resolutor llegó a pedir. Una llamada a
/// `load_more` que cae en la puerta single-flight no cuenta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorState {
    /// No se pidió ningún ancla. Terminal.
    Idle,
    Searching { target: String, fetches: u32 },
    Found { target: String, fetches: u32 },
    /// Límite alcanzado o colección agotada sin encontrar el id. Terminal.
    Exhausted { target: String, fetches: u32 },
}

impl AnchorState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Searching { .. })
    }
}

pub struct AnchorResolver {
    state: AnchorState,
    max_pages: u32,
    highlight: Duration,
}

impl AnchorResolver {
    /// `target == None` deja el resolutor en `Idle`.
    pub fn new(target: Option<String>, max_pages: u32, highlight: Duration) -> Self {
        let state = match target {
            Some(target) => AnchorState::Searching { target, fetches: 0 },
            None => AnchorState::Idle,
        };
        Self { state, max_pages, highlight }
    }

    /// Construye el resolutor a partir de un fragmento de URL (`"#q42"`).
    /// Un fragmento vacío no pide ancla.
    pub fn from_fragment(fragment: &str, config: &FeedEngineConfig) -> Self {
        let target = fragment.trim().trim_start_matches('#').trim();
        let target = (!target.is_empty()).then(|| target.to_string());
        Self::new(target, config.anchor_max_pages, config.highlight)
    }

    pub fn state(&self) -> &AnchorState {
        &self.state
    }

    pub fn target(&self) -> Option<&str> {
        match &self.state {
            AnchorState::Idle => None,
            AnchorState::Searching { target, .. }
            | AnchorState::Found { target, .. }
            | AnchorState::Exhausted { target, .. } => Some(target),
        }
    }

    /// Ejecuta la búsqueda hasta un estado terminal. Debe llamarse con la
    /// vista en reposo (carga inicial resuelta); aun así espera a que no haya
    /// peticiones en vuelo antes de empezar.
    ///
    /// Cada reintento hace una llamada a `load_more` y vuelve a comprobar; el
    /// límite sólo descuenta las que emitieron petición. Si la sesión cambia a mitad de búsqueda, el ancla se da por
    /// agotada.
    pub async fn resolve<F>(&mut self, engine: &FeedEngine<F>, effect: &dyn AnchorEffect) -> &AnchorState
        where F: PageFetcher
    {
        let (target, mut fetches) = match &self.state {
            AnchorState::Searching { target, fetches } => (target.clone(), *fetches),
            _ => return &self.state,
        };

        engine.wait_idle().await;
        let session: SessionId = engine.session();

        self.state = loop {
            if engine.is_rendered(&target) {
                effect.reveal(&target, self.highlight);
                log::info!("ancla {} encontrada tras {} páginas extra", target, fetches);
                break AnchorState::Found { target, fetches };
            }
            if !engine.state().has_more() || engine.session() != session {
                log::info!("ancla {} no encontrada: no quedan páginas", target);
                break AnchorState::Exhausted { target, fetches };
            }
            if fetches >= self.max_pages {
                log::info!("ancla {} no encontrada tras {} páginas extra", target, fetches);
                break AnchorState::Exhausted { target, fetches };
            }
            engine.wait_idle().await;
            let outcome = engine.load_more().await;
            if outcome.issued_request() {
                fetches += 1;
            }
            log::debug!("ancla {}: reintento {} -> {:?}", target, fetches, outcome);
        };
        &self.state
    }
}
