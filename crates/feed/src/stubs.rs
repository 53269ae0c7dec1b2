// Archivo: stubs.rs
// Propósito: implementaciones en memoria para pruebas y wiring rápido.
//
// Incluye una colección paginada en memoria (`InMemoryCollection`) y una
// vista que registra lo renderizado (`RecordingView`). No son durables y se
// usan para demos o pruebas locales.
use crate::domain::{Cursor, Item, LoadPhase, Page};
use crate::errors::{FeedError, Result};
use crate::repository::{AnchorEffect, ItemCreator, PageFetcher, RenderSink, Viewport, ViewportMetrics};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use uuid::Uuid;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Colección en memoria ordenada de más reciente a más antiguo, paginada
/// con un cursor `{"offset": n}`.
///
/// Permite:
/// - inyectar fallos en la petición n-ésima (`fail_request`)
/// - retener las peticiones en vuelo hasta `release` (`hold`)
/// - modo `stall`: páginas vacías que siempre traen cursor
#[derive(Debug)]
pub struct InMemoryCollection {
    items: Mutex<Vec<Item>>,
    /// Cursores recibidos, en orden de petición.
    requests: Mutex<Vec<Option<Cursor>>>,
    failures: Mutex<HashSet<usize>>,
    create_rejections: Mutex<VecDeque<String>>,
    creates: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    held: AtomicBool,
    gate: Semaphore,
    stall: AtomicBool,
}

impl InMemoryCollection {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items: Mutex::new(items),
               requests: Mutex::new(Vec::new()),
               failures: Mutex::new(HashSet::new()),
               create_rejections: Mutex::new(VecDeque::new()),
               creates: AtomicUsize::new(0),
               in_flight: AtomicUsize::new(0),
               max_in_flight: AtomicUsize::new(0),
               held: AtomicBool::new(false),
               gate: Semaphore::new(0),
               stall: AtomicBool::new(false) }
    }

    /// Colección de `count` items con ids `"{prefix}1".."{prefix}{count}"`.
    pub fn numbered(prefix: &str, count: usize) -> Self {
        Self::new((1..=count).map(|i| Item::new(format!("{prefix}{i}"), format!("contenido {i}")))
                             .collect())
    }

    /// La petición `index` (base 0, contando todas) fallará.
    pub fn fail_request(&self, index: usize) {
        lock(&self.failures).insert(index);
    }

    /// La próxima creación se rechaza con `message`.
    pub fn reject_next_create(&self, message: &str) {
        lock(&self.create_rejections).push_back(message.to_string());
    }

    /// Las peticiones siguientes quedan retenidas hasta `release`.
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Libera `n` peticiones retenidas (o futuras).
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Deja de retener peticiones nuevas.
    pub fn unhold(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    pub fn stall(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Option<Cursor>> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Máximo de peticiones simultáneas observado.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn offset_of(cursor: Option<&Cursor>) -> Result<usize> {
        match cursor {
            None => Ok(0),
            Some(c) => c.as_value()
                        .get("offset")
                        .and_then(|v| v.as_u64())
                        .map(|v| v as usize)
                        .ok_or_else(|| FeedError::Malformed(format!("cursor desconocido {}", c))),
        }
    }

    fn page_at(&self, offset: usize, limit: usize) -> Page {
        if self.stall.load(Ordering::SeqCst) {
            return Page { items: Vec::new(), cursor: Some(Cursor::new(json!({ "offset": offset }))) };
        }
        let items = lock(&self.items);
        let end = (offset + limit).min(items.len());
        let page: Vec<Item> = items.get(offset..end).map(<[Item]>::to_vec).unwrap_or_default();
        let cursor = (end < items.len()).then(|| Cursor::new(json!({ "offset": end })));
        Page { items: page, cursor }
    }
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Decrementa el contador de peticiones en vuelo al salir.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageFetcher for InMemoryCollection {
    async fn fetch_page(&self, cursor: Option<&Cursor>, limit: u32) -> Result<Page> {
        let index = {
            let mut requests = lock(&self.requests);
            requests.push(cursor.cloned());
            requests.len() - 1
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if self.held.load(Ordering::SeqCst) {
            let permit = self.gate
                             .acquire()
                             .await
                             .map_err(|e| FeedError::Transport(format!("gate cerrada: {}", e)))?;
            permit.forget();
        }
        tokio::task::yield_now().await;

        if lock(&self.failures).contains(&index) {
            return Err(FeedError::Transport(format!("fallo simulado en la petición {}", index)));
        }
        let offset = Self::offset_of(cursor)?;
        Ok(self.page_at(offset, limit as usize))
    }
}

#[async_trait]
impl ItemCreator for InMemoryCollection {
    async fn create_item(&self, content: &str) -> Result<Option<Item>> {
        if let Some(message) = lock(&self.create_rejections).pop_front() {
            return Err(FeedError::Rejected(message));
        }
        let item = Item { id: Uuid::new_v4().to_string(), content: content.to_string(), created_at: Some(Utc::now()) };
        lock(&self.items).insert(0, item.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(Some(item))
    }
}

/// Vista en memoria: registra lo renderizado, los errores y las anclas
/// reveladas, y simula un viewport de filas de altura fija.
#[derive(Debug)]
pub struct RecordingView {
    ids: Mutex<Vec<String>>,
    errors: Mutex<Vec<(LoadPhase, String)>>,
    revealed: Mutex<Vec<(String, Duration)>>,
    row_height: f64,
    viewport_height: f64,
    scroll_top: Mutex<f64>,
    duplicates: AtomicUsize,
}

impl RecordingView {
    pub fn new(row_height: f64, viewport_height: f64) -> Self {
        Self { ids: Mutex::new(Vec::new()),
               errors: Mutex::new(Vec::new()),
               revealed: Mutex::new(Vec::new()),
               row_height,
               viewport_height,
               scroll_top: Mutex::new(0.0),
               duplicates: AtomicUsize::new(0) }
    }

    /// Viewport muy alto: el contenido nunca lo llena.
    pub fn short() -> Self {
        Self::new(1.0, f64::MAX)
    }

    /// Viewport que cualquier contenido llena.
    pub fn tall_content() -> Self {
        Self::new(f64::MAX, 1.0)
    }

    pub fn ids(&self) -> Vec<String> {
        lock(&self.ids).clone()
    }

    pub fn errors(&self) -> Vec<(LoadPhase, String)> {
        lock(&self.errors).clone()
    }

    pub fn revealed(&self) -> Vec<(String, Duration)> {
        lock(&self.revealed).clone()
    }

    /// Veces que el sink recibió un id ya presente.
    pub fn duplicates(&self) -> usize {
        self.duplicates.load(Ordering::SeqCst)
    }

    pub fn scroll_to(&self, scroll_top: f64) {
        *lock(&self.scroll_top) = scroll_top;
    }

    pub fn scroll_to_bottom(&self) {
        let content = lock(&self.ids).len() as f64 * self.row_height;
        self.scroll_to((content - self.viewport_height).max(0.0));
    }
}

impl RenderSink for RecordingView {
    fn replace(&self, items: &[Item]) {
        let mut ids = lock(&self.ids);
        ids.clear();
        ids.extend(items.iter().map(|i| i.id.clone()));
    }

    fn append(&self, items: &[Item]) {
        let mut ids = lock(&self.ids);
        for item in items {
            if ids.contains(&item.id) {
                self.duplicates.fetch_add(1, Ordering::SeqCst);
                continue;
            }
            ids.push(item.id.clone());
        }
    }

    fn clear(&self) {
        lock(&self.ids).clear();
        *lock(&self.scroll_top) = 0.0;
    }

    fn show_error(&self, phase: LoadPhase, message: &str) {
        lock(&self.errors).push((phase, message.to_string()));
    }
}

impl AnchorEffect for RecordingView {
    fn reveal(&self, id: &str, highlight: Duration) -> bool {
        if !lock(&self.ids).iter().any(|i| i == id) {
            return false;
        }
        lock(&self.revealed).push((id.to_string(), highlight));
        true
    }
}

impl Viewport for RecordingView {
    fn metrics(&self) -> ViewportMetrics {
        ViewportMetrics { scroll_top: *lock(&self.scroll_top),
                          viewport_height: self.viewport_height,
                          content_height: lock(&self.ids).len() as f64 * self.row_height }
    }
}
