// Archivo: engine.rs
// Propósito: implementar el `FeedEngine`, la máquina de estados de carga
// incremental (carga inicial, página siguiente y reinicio).
//
// Nota: el motor es el único que muta el `PaginationState` y la vista
// renderizada. Disparadores y ancla sólo invocan sus operaciones.
use crate::config::FeedEngineConfig;
use crate::domain::{Cursor, Item, LoadOutcome, LoadPhase, Page, PaginationState, SessionId, SkipReason};
use crate::repository::{PageFetcher, RenderSink};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// Motor de carga incremental con disciplina single-flight.
///
/// Responsabilidades principales:
/// - Pedir páginas en orden de cursor, nunca dos a la vez
/// - Aplicar cada página a la vista (reemplazo o append) sin duplicar ids
/// - Cerrar siempre el estado de carga, también si la petición falla o el
///   future se abandona
///
/// Nota sobre concurrencia:
/// - `load_initial`/`load_more` que llegan con una petición en vuelo o con
///   `has_more == false` no hacen nada: no se encolan ni devuelven error.
/// - El lock interno nunca se mantiene a través de un `.await`; la única
///   suspensión es la petición al `PageFetcher`.
pub struct FeedEngine<F>
    where F: PageFetcher
{
    fetcher: Arc<F>,
    sink: Arc<dyn RenderSink>,
    config: FeedEngineConfig,
    inner: Mutex<EngineState>,
    /// Se notifica cada vez que una petición se resuelve.
    settled: Notify,
}

struct EngineState {
    pagination: PaginationState,
    session: SessionId,
    /// Items renderizados en orden de llegada, indexados por id.
    rendered: IndexMap<String, Item>,
    fetches: u64,
    last_error: Option<String>,
}

impl EngineState {
    fn new() -> Self {
        Self { pagination: PaginationState::new(),
               session: SessionId::default(),
               rendered: IndexMap::new(),
               fetches: 0,
               last_error: None }
    }
}

impl<F> FeedEngine<F> where F: PageFetcher
{
    /// Crea el motor con una sesión nueva. No emite ninguna petición.
    pub fn new(fetcher: Arc<F>, sink: Arc<dyn RenderSink>, config: FeedEngineConfig) -> Self {
        Self { fetcher,
               sink,
               config,
               inner: Mutex::new(EngineState::new()),
               settled: Notify::new() }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_loading(&self) -> bool {
        self.lock().pagination.loading()
    }

    pub fn config(&self) -> &FeedEngineConfig {
        &self.config
    }

    /// Copia del estado de paginación actual.
    pub fn state(&self) -> PaginationState {
        self.lock().pagination.clone()
    }

    pub fn session(&self) -> SessionId {
        self.lock().session
    }

    pub fn is_rendered(&self, id: &str) -> bool {
        self.lock().rendered.contains_key(id)
    }

    /// Ids renderizados, en el orden de la vista.
    pub fn rendered_ids(&self) -> Vec<String> {
        self.lock().rendered.keys().cloned().collect()
    }

    pub fn rendered_len(&self) -> usize {
        self.lock().rendered.len()
    }

    /// Peticiones emitidas desde la creación del motor (incluye todas las
    /// sesiones).
    pub fn fetch_count(&self) -> u64 {
        self.lock().fetches
    }

    /// Mensaje del último fallo de carga de la sesión actual.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Pide la primera página y reemplaza la vista. Si falla, la vista previa
    /// se conserva y la carga automática termina.
    pub async fn load_initial(&self) -> LoadOutcome {
        self.load(LoadPhase::Initial).await
    }

    /// Pide la página del cursor actual y la añade al final de la vista.
    pub async fn load_more(&self) -> LoadOutcome {
        self.load(LoadPhase::More).await
    }

    async fn load(&self, phase: LoadPhase) -> LoadOutcome {
        let (cursor, session) = {
            let mut st = self.lock();
            if st.pagination.loading() {
                log::debug!("carga {:?} ignorada: petición en vuelo", phase);
                return LoadOutcome::Skipped(SkipReason::InFlight);
            }
            if !st.pagination.has_more() {
                log::debug!("carga {:?} ignorada: no quedan páginas", phase);
                return LoadOutcome::Skipped(SkipReason::Exhausted);
            }
            st.pagination.mark_loading();
            st.fetches += 1;
            let cursor = match phase {
                LoadPhase::Initial => None,
                LoadPhase::More => st.pagination.cursor().cloned(),
            };
            (cursor, st.session)
        };

        let mut guard = SettleGuard { engine: self, session, done: false };
        log::debug!("pidiendo página (cursor: {:?}, limit: {})",
                    cursor.as_ref().map(Cursor::to_query_param),
                    self.config.page_limit);

        match self.fetcher.fetch_page(cursor.as_ref(), self.config.page_limit).await {
            Ok(Page { items, cursor: next }) => {
                let received = items.len();
                let fresh = self.absorb(phase, session, items);
                match phase {
                    LoadPhase::Initial => self.sink.replace(&fresh),
                    LoadPhase::More => self.sink.append(&fresh),
                }
                let has_more = guard.settle(next, false);
                LoadOutcome::Loaded { received, rendered: fresh.len(), has_more }
            }
            Err(e) => {
                let message = e.to_string();
                match phase {
                    LoadPhase::Initial => log::error!("carga inicial fallida: {}", message),
                    LoadPhase::More => log::warn!("carga de página fallida, se detiene la carga: {}", message),
                }
                self.lock().last_error = Some(message.clone());
                self.sink.show_error(phase, &message);
                guard.settle(None, true);
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Incorpora los items recibidos al conjunto renderizado y devuelve los
    /// que realmente hay que enviar al sink (sin ids repetidos).
    fn absorb(&self, phase: LoadPhase, session: SessionId, items: Vec<Item>) -> Vec<Item> {
        let mut st = self.lock();
        if st.session != session {
            return Vec::new();
        }
        if phase == LoadPhase::Initial {
            st.rendered.clear();
        }
        let mut fresh = Vec::with_capacity(items.len());
        for item in items {
            if st.rendered.contains_key(&item.id) {
                log::debug!("item {} ya renderizado, se omite", item.id);
                continue;
            }
            st.rendered.insert(item.id.clone(), item.clone());
            fresh.push(item);
        }
        fresh
    }

    /// Reinicia la sesión: estado inicial, vista vacía y nuevo `SessionId`.
    /// Si hay una petición en vuelo espera a que se resuelva; las peticiones
    /// no se cancelan.
    pub async fn reset(&self) {
        loop {
            let notified = self.settled.notified();
            if self.try_reset() {
                return;
            }
            notified.await;
        }
    }

    /// Variante sin espera de `reset`: no hace nada y devuelve `false` si hay
    /// una petición en vuelo.
    pub fn try_reset(&self) -> bool {
        let session = {
            let mut st = self.lock();
            if st.pagination.loading() {
                return false;
            }
            st.pagination.reset();
            st.rendered.clear();
            st.last_error = None;
            st.session = st.session.next();
            st.session
        };
        self.sink.clear();
        log::info!("feed reiniciado, sesión {}", session.0);
        true
    }

    /// Espera a que no haya ninguna petición en vuelo.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.settled.notified();
            if !self.is_loading() {
                return;
            }
            notified.await;
        }
    }
}

/// Cierra la petición en vuelo en cualquier salida: éxito, error o future
/// abandonado a mitad de la petición.
struct SettleGuard<'a, F>
    where F: PageFetcher
{
    engine: &'a FeedEngine<F>,
    session: SessionId,
    done: bool,
}

impl<F> SettleGuard<'_, F> where F: PageFetcher
{
    /// Aplica el resultado al estado y despierta a quien espere. Devuelve
    /// `has_more` tras el cierre.
    fn settle(&mut self, next: Option<Cursor>, had_error: bool) -> bool {
        self.done = true;
        let has_more = {
            let mut st = self.engine.lock();
            if st.session == self.session {
                st.pagination.mark_settled(next, had_error);
            }
            st.pagination.has_more()
        };
        self.engine.settled.notify_waiters();
        has_more
    }
}

impl<F> Drop for SettleGuard<'_, F> where F: PageFetcher
{
    fn drop(&mut self) {
        if !self.done {
            log::warn!("petición abandonada antes de resolverse, se da por fallida");
            self.settle(None, true);
        }
    }
}
