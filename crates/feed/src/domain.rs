// Archivo: domain.rs
// Propósito: tipos del modelo de datos (cursor, item, página) y el estado de
// paginación que decide si puede comenzar otra carga.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Token opaco de paginación devuelto por el endpoint.
///
/// El cliente nunca lo interpreta: se devuelve tal cual en la siguiente
/// petición. Hay endpoints que devuelven una clave estructurada (objeto
/// JSON), por eso el contenido es un `JsonValue` arbitrario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(JsonValue);

impl Cursor {
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }

    /// Representación para el parámetro `cursor` de la query. Los tokens de
    /// texto viajan literales; cualquier otro valor como JSON compacto.
    pub fn to_query_param(&self) -> String {
        match &self.0 {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self(JsonValue::String(token.to_string()))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_param())
    }
}

/// Registro de la colección. La identidad (`id`) sólo se usa para el ancla y
/// para no renderizar dos veces el mismo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(alias = "SK")]
    pub id: String,
    #[serde(alias = "quote")]
    pub content: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id: id.into(), content: content.into(), created_at: None }
    }
}

/// Página devuelta por el endpoint. `cursor` ausente o `null` indica la
/// última página.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

impl Page {
    pub fn is_terminal(&self) -> bool {
        self.cursor.is_none()
    }
}

/// Estado de paginación de una sesión.
///
/// Invariantes:
/// - `loading` cubre todo el intervalo entre el inicio de la petición y su
///   resolución; como mucho hay una petición en vuelo.
/// - `has_more == false` no vuelve a `true` salvo con `reset`.
/// - `cursor` sólo cambia tras una petición exitosa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    cursor: Option<Cursor>,
    has_more: bool,
    loading: bool,
}

impl PaginationState {
    pub fn new() -> Self {
        Self { cursor: None, has_more: true, loading: false }
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// `true` si no hay petición en vuelo y quedan páginas.
    pub fn can_start_load(&self) -> bool {
        !self.loading && self.has_more
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    /// Cierra la petición en vuelo. Con `had_error` el cursor se conserva y
    /// `has_more` queda en `false`.
    pub fn mark_settled(&mut self, next_cursor: Option<Cursor>, had_error: bool) {
        self.has_more = next_cursor.is_some() && !had_error && self.has_more;
        if !had_error {
            self.cursor = next_cursor;
        }
        self.loading = false;
    }

    /// Vuelve al estado inicial `{cursor: None, has_more: true, loading: false}`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Identificador de sesión: cambia en cada `reset`. Los disparadores que
/// guardan un token antiguo quedan sin efecto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionId(pub u64);

impl SessionId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Tipo de carga, usado al informar errores al sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Initial,
    More,
}

/// Motivo por el que una carga no llegó a emitir petición.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Ya hay una petición en vuelo.
    InFlight,
    /// `has_more == false`.
    Exhausted,
}

/// Resultado de `load_initial` / `load_more`. Los errores de red no se
/// propagan: se reportan y terminan la carga automática.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { received: usize, rendered: usize, has_more: bool },
    Skipped(SkipReason),
    Failed(String),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// `true` si la llamada emitió una petición (con éxito o no).
    pub fn issued_request(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}
