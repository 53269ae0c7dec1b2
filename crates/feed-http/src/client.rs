// Archivo: client.rs
// Propósito: implementación HTTP (`reqwest`) de `PageFetcher` e
// `ItemCreator`.
use crate::config::HttpConfig;
use crate::wire::{self, CreateRequest};
use async_trait::async_trait;
use feed::{Cursor, FeedError, Item, ItemCreator, Page, PageFetcher, Result};
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;

/// Colección remota `GET/POST <base>/<colección>`.
pub struct HttpCollection {
  client: Client,
  config: HttpConfig,
}

impl HttpCollection {
  pub fn new(config: HttpConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout)
                                  .user_agent(concat!("feedscroll/", env!("CARGO_PKG_VERSION")))
                                  .build()
                                  .map_err(|e| FeedError::Config(format!("no se pudo crear el cliente HTTP: {}", e)))?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &HttpConfig {
    &self.config
  }
}

fn transport(e: reqwest::Error) -> FeedError {
  FeedError::Transport(e.to_string())
}

#[async_trait]
impl PageFetcher for HttpCollection {
  async fn fetch_page(&self, cursor: Option<&Cursor>, limit: u32) -> Result<Page> {
    let response = self.client
                       .get(self.config.collection_url())
                       .query(&wire::page_query(cursor, limit))
                       .header(CACHE_CONTROL, "no-store")
                       .send()
                       .await
                       .map_err(transport)?;
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if !status.is_success() {
      return Err(wire::status_error(&self.config.collection, status.as_u16(), &body));
    }
    wire::decode_page(&body)
  }
}

#[async_trait]
impl ItemCreator for HttpCollection {
  async fn create_item(&self, content: &str) -> Result<Option<Item>> {
    let response = self.client
                       .post(self.config.collection_url())
                       .json(&CreateRequest { content })
                       .send()
                       .await
                       .map_err(transport)?;
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if !status.is_success() {
      return Err(wire::rejection(&self.config.collection, status.as_u16(), &body));
    }
    wire::decode_created(&body)
  }
}
