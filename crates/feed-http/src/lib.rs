//! Backend HTTP para el crate `feed`.
//! Este crate expone `HttpCollection`, que implementa `PageFetcher` e
//! `ItemCreator` sobre el endpoint `<base>/<colección>`, y la configuración
//! leída del entorno. El formato de los mensajes está en `wire.rs`.

mod client;
mod config;
pub mod wire;

pub use client::HttpCollection;
pub use config::HttpConfig;

/// Crea la colección HTTP a partir de las variables de entorno (o `.env`).
pub fn new_from_env() -> feed::Result<HttpCollection> {
    HttpCollection::new(HttpConfig::from_env()?)
}
