// Archivo: config.rs
// Propósito: configuración del backend HTTP leída del entorno.
use feed::config::{MAX_PAGE_LIMIT, MIN_PAGE_LIMIT};
use feed::{FeedError, Result};
use std::time::Duration;

const DEFAULT_COLLECTION: &str = "quotes";
const DEFAULT_PAGE_LIMIT: u32 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Parámetros del endpoint de colección.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
  /// Base del API sin `/` final (p. ej. `https://api.example.com`).
  pub api_base: String,
  /// Ruta de la colección relativa a la base.
  pub collection: String,
  pub page_limit: u32,
  /// Timeout del transporte; al vencer se trata como fallo de red.
  pub timeout: Duration,
}

impl HttpConfig {
  pub fn new(api_base: &str) -> Self {
    Self { api_base: api_base.trim().trim_end_matches('/').to_string(),
           collection: DEFAULT_COLLECTION.to_string(),
           page_limit: DEFAULT_PAGE_LIMIT,
           timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS) }
  }

  /// URL completa de la colección.
  pub fn collection_url(&self) -> String {
    format!("{}/{}", self.api_base, self.collection.trim_matches('/'))
  }

  /// Carga `.env` si existe y lee `FEED_API_BASE` (obligatoria),
  /// `FEED_COLLECTION`, `FEED_PAGE_LIMIT` y `FEED_TIMEOUT_SECS`.
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Igual que `from_env` pero con una fuente de variables arbitraria.
  pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where L: Fn(&str) -> Option<String>
  {
    let base = lookup("FEED_API_BASE").filter(|v| !v.trim().is_empty())
                                      .ok_or_else(|| FeedError::Config("FEED_API_BASE no está definida".into()))?;
    let l = base.to_lowercase();
    if !(l.starts_with("http://") || l.starts_with("https://")) {
      return Err(FeedError::Config(format!("FEED_API_BASE no parece una URL http(s): {}", base)));
    }
    let mut config = Self::new(&base);

    if let Some(collection) = lookup("FEED_COLLECTION").filter(|v| !v.trim().is_empty()) {
      config.collection = collection.trim().trim_matches('/').to_string();
    }
    if let Some(raw) = lookup("FEED_PAGE_LIMIT") {
      let limit: u32 = raw.trim()
                          .parse()
                          .map_err(|_| FeedError::Config(format!("FEED_PAGE_LIMIT inválido: {}", raw)))?;
      config.page_limit = limit.clamp(MIN_PAGE_LIMIT, MAX_PAGE_LIMIT);
    }
    if let Some(raw) = lookup("FEED_TIMEOUT_SECS") {
      let secs: u64 = raw.trim()
                         .parse()
                         .map_err(|_| FeedError::Config(format!("FEED_TIMEOUT_SECS inválido: {}", raw)))?;
      config.timeout = Duration::from_secs(secs.max(1));
    }
    Ok(config)
  }
}
