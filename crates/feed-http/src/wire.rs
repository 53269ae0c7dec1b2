// Archivo: wire.rs
// Propósito: formato de los mensajes del endpoint de colección: parámetros
// de la query, decodificación de páginas, cuerpos de error y respuesta de
// creación.
use chrono::{DateTime, Utc};
use feed::{Cursor, FeedError, Item, Page, Result};
use serde::{Deserialize, Serialize};

/// Cuerpo de `POST <colección>`.
#[derive(Debug, Serialize)]
pub struct CreateRequest<'a> {
  pub content: &'a str,
}

/// Cuerpo de error `{ "error": "..." }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  error: Option<String>,
}

/// El endpoint puede devolver el item creado o sólo un recibo con la fecha.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateResponse {
  Item(Item),
  Receipt {
    #[serde(rename = "createdAt", default)]
    created_at: Option<DateTime<Utc>>,
  },
}

/// Parámetros de `GET <colección>`; `cursor` se omite si no hay.
pub fn page_query(cursor: Option<&Cursor>, limit: u32) -> Vec<(&'static str, String)> {
  let mut query = vec![("limit", limit.to_string())];
  if let Some(cursor) = cursor {
    query.push(("cursor", cursor.to_query_param()));
  }
  query
}

pub fn decode_page(body: &str) -> Result<Page> {
  serde_json::from_str(body).map_err(|e| FeedError::Malformed(format!("página inválida: {}", e)))
}

/// Mensaje del campo `error` del cuerpo, si lo hay.
pub fn error_message(body: &str) -> Option<String> {
  serde_json::from_str::<ErrorBody>(body).ok()
                                        .and_then(|b| b.error)
                                        .filter(|m| !m.trim().is_empty())
}

/// Error para una lectura con estado no exitoso.
pub fn status_error(collection: &str, status: u16, body: &str) -> FeedError {
  let message = error_message(body).unwrap_or_else(|| format!("GET /{} falló ({})", collection, status));
  FeedError::Status { status, message }
}

/// Error para una creación rechazada; el mensaje llega tal cual a quien
/// publica.
pub fn rejection(collection: &str, status: u16, body: &str) -> FeedError {
  FeedError::Rejected(error_message(body).unwrap_or_else(|| format!("POST /{} falló ({})", collection, status)))
}

pub fn decode_created(body: &str) -> Result<Option<Item>> {
  if body.trim().is_empty() {
    return Ok(None);
  }
  match serde_json::from_str::<CreateResponse>(body)? {
    CreateResponse::Item(item) => Ok(Some(item)),
    CreateResponse::Receipt { created_at } => {
      log::debug!("creación confirmada sin item (createdAt: {:?})", created_at);
      Ok(None)
    }
  }
}
