// Archivo: service.rs
// Propósito: implementar `FeedService`, la capa que compone motor,
// disparadores y ancla, y que expone la apertura de la lista y el flujo de
// publicación de un item nuevo.
use crate::anchor::{AnchorResolver, AnchorState};
use crate::config::FeedEngineConfig;
use crate::domain::{Item, LoadOutcome, SessionId};
use crate::engine::FeedEngine;
use crate::errors::{FeedError, Result};
use crate::repository::{AnchorEffect, ItemCreator, PageFetcher, RenderSink, Viewport};
use crate::triggers::TriggerHub;
use std::sync::Arc;

/// Resultado de abrir la lista.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenReport {
    pub initial: LoadOutcome,
    pub anchor: AnchorState,
}

/// Servicio de alto nivel sobre una lista paginada.
///
/// Esta capa orquesta el motor, los disparadores y el ancla. Está pensada
/// para ser invocada desde la capa de UI.
pub struct FeedService<F, C>
    where F: PageFetcher,
          C: ItemCreator
{
    engine: Arc<FeedEngine<F>>,
    triggers: Arc<TriggerHub<F>>,
    creator: Arc<C>,
    effect: Arc<dyn AnchorEffect>,
}

impl<F, C> FeedService<F, C>
    where F: PageFetcher + 'static,
          C: ItemCreator + 'static
{
    /// Crea el servicio. El `FeedEngine` y el `TriggerHub` se construyen
    /// internamente y se reusan entre sesiones.
    pub fn new(fetcher: Arc<F>,
               creator: Arc<C>,
               sink: Arc<dyn RenderSink>,
               viewport: Arc<dyn Viewport>,
               effect: Arc<dyn AnchorEffect>,
               config: FeedEngineConfig)
               -> Self {
        let engine = Arc::new(FeedEngine::new(fetcher, sink, config));
        let triggers = Arc::new(TriggerHub::new(engine.clone(), viewport));
        Self { engine, triggers, creator, effect }
    }

    pub fn engine(&self) -> &Arc<FeedEngine<F>> {
        &self.engine
    }

    pub fn triggers(&self) -> &Arc<TriggerHub<F>> {
        &self.triggers
    }

    /// Token de disparo de la sesión actual.
    pub fn session(&self) -> SessionId {
        self.engine.session()
    }

    /// Abre la lista: carga inicial, relleno de viewport corto y, si
    /// `fragment` trae un id, resolución del ancla.
    pub async fn open(&self, fragment: Option<&str>) -> OpenReport {
        let token = self.triggers.arm();
        let initial = self.engine.load_initial().await;
        self.triggers.fill_viewport(token).await;
        let anchor = self.resolve_anchor(fragment.unwrap_or_default()).await;
        OpenReport { initial, anchor }
    }

    /// Busca el ancla indicada por `fragment` sobre la sesión actual.
    pub async fn resolve_anchor(&self, fragment: &str) -> AnchorState {
        let mut resolver = AnchorResolver::from_fragment(fragment, self.engine.config());
        resolver.resolve(&*self.engine, &*self.effect).await.clone()
    }

    /// Publica un item nuevo. Si el endpoint lo acepta, reinicia la sesión y
    /// hace una única carga inicial para que el item (ordenado por más
    /// reciente) aparezca sin recargar.
    ///
    /// Los fallos de creación se devuelven tal cual, sin reintento y sin
    /// tocar el estado de paginación.
    pub async fn submit(&self, content: &str) -> Result<Option<Item>> {
        let content = content.trim();
        if content.is_empty() {
            return Err(FeedError::Validation("el contenido no puede estar vacío".into()));
        }
        let created = match self.creator.create_item(content).await {
            Ok(created) => created,
            Err(e) => {
                log::warn!("no se pudo publicar el item: {}", e);
                return Err(e);
            }
        };
        self.refresh().await;
        Ok(created)
    }

    /// Reinicia la sesión y vuelve a cargar desde el inicio.
    pub async fn refresh(&self) -> LoadOutcome {
        self.engine.reset().await;
        let token = self.triggers.arm();
        let outcome = self.engine.load_initial().await;
        self.triggers.fill_viewport(token).await;
        outcome
    }
}
