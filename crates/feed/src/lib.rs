//! Crate `feed`: carga incremental de listas paginadas por cursor
//!
//! Este crate define el modelo (`Cursor`, `Item`, `Page`, `PaginationState`),
//! los contratos con los colaboradores externos (`PageFetcher`,
//! `ItemCreator`, `RenderSink`, `AnchorEffect`, `Viewport`), el motor de
//! carga `FeedEngine`, el multiplexor de disparadores `TriggerHub`, el
//! resolutor de anclas `AnchorResolver` y el servicio `FeedService` que los
//! compone. También incluye implementaciones en memoria útiles para pruebas.
//!
//! Diseño resumido:
//! - Single-flight: como mucho una petición en vuelo; las llamadas que
//!   llegan mientras tanto no hacen nada.
//! - Orden por cursor: una página nunca se pide antes de aplicar la anterior.
//! - Degradación: cualquier fallo de carga deja `has_more == false` y
//!   conserva lo ya renderizado; un `reset` abre una sesión limpia.
//!
//! Ejemplo rápido:
//! ```rust
//! use feed::stubs::{InMemoryCollection, RecordingView};
//! use feed::{FeedEngine, FeedEngineConfig};
//! use std::sync::Arc;
//! let repo = Arc::new(InMemoryCollection::numbered("i", 15));
//! let view = Arc::new(RecordingView::tall_content());
//! let engine = FeedEngine::new(repo, view, FeedEngineConfig::default());
//! assert!(engine.state().can_start_load());
//! ```
pub mod anchor;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod repository;
pub mod service;
pub mod stubs;
pub mod triggers;

pub use anchor::*;
pub use config::*;
pub use domain::*;
pub use engine::*;
pub use errors::*;
pub use repository::*;
pub use service::*;
pub use triggers::*;
