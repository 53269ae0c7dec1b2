// Archivo: terminal.rs
// Propósito: vista de terminal para `feed-cli`. Implementa el sink de
// render, el efecto del ancla y un viewport simulado en filas.
use feed::{AnchorEffect, Item, LoadPhase, RenderSink, Viewport, ViewportMetrics};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Filas visibles del viewport simulado.
const VIEWPORT_ROWS: f64 = 20.0;

pub struct TerminalView {
  items: Mutex<Vec<Item>>,
  scroll_top: Mutex<f64>,
}

impl TerminalView {
  pub fn new() -> Self {
    Self { items: Mutex::new(Vec::new()), scroll_top: Mutex::new(0.0) }
  }

  fn items(&self) -> MutexGuard<'_, Vec<Item>> {
    self.items.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn scroll(&self) -> MutexGuard<'_, f64> {
    self.scroll_top.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Imprime todos los items cargados, numerados.
  pub fn print_all(&self) {
    let items = self.items();
    if items.is_empty() {
      println!("(sin items)");
    }
    for (i, item) in items.iter().enumerate() {
      print_item(i + 1, item);
    }
  }

  /// Lleva el scroll al final del contenido.
  pub fn scroll_to_bottom(&self) {
    let rows = self.items().len() as f64;
    *self.scroll() = (rows - VIEWPORT_ROWS).max(0.0);
  }
}

impl Default for TerminalView {
  fn default() -> Self {
    Self::new()
  }
}

fn print_item(n: usize, item: &Item) {
  let when = item.created_at
                 .map(|t| t.format("%B %d, %Y %H:%M:%S").to_string())
                 .unwrap_or_else(|| "-".into());
  println!("{:>4}. [{}] {}  ({})", n, item.id, item.content, when);
}

impl RenderSink for TerminalView {
  fn replace(&self, items: &[Item]) {
    let mut current = self.items();
    current.clear();
    current.extend_from_slice(items);
    println!("-- {} items cargados --", items.len());
  }

  fn append(&self, items: &[Item]) {
    let mut current = self.items();
    let start = current.len();
    for (i, item) in items.iter().enumerate() {
      print_item(start + i + 1, item);
    }
    current.extend_from_slice(items);
  }

  fn clear(&self) {
    self.items().clear();
    *self.scroll() = 0.0;
  }

  fn show_error(&self, phase: LoadPhase, message: &str) {
    match phase {
      LoadPhase::Initial => eprintln!("Error cargando items: {}", message),
      LoadPhase::More => eprintln!("No se pudieron cargar más items: {}", message),
    }
  }
}

impl AnchorEffect for TerminalView {
  fn reveal(&self, id: &str, highlight: Duration) -> bool {
    let items = self.items();
    let Some(pos) = items.iter().position(|i| i.id == id) else {
      return false;
    };
    println!(">>> resaltado durante {}s", highlight.as_secs());
    print_item(pos + 1, &items[pos]);
    drop(items);
    *self.scroll() = pos as f64;
    true
  }
}

impl Viewport for TerminalView {
  fn metrics(&self) -> ViewportMetrics {
    ViewportMetrics { scroll_top: *self.scroll(),
                      viewport_height: VIEWPORT_ROWS,
                      content_height: self.items().len() as f64 }
  }
}
