// Archivo: errors.rs
// Propósito: definir los errores del feed y el alias Result<T> usado por
// las APIs del crate.
use thiserror::Error;

/// Errores comunes de la carga incremental.
///
/// - `Transport`, `Status` y `Malformed` son fallos de carga de página: el
///   motor los trata igual (fin de la carga automática).
/// - `Rejected` y `Validation` pertenecen al flujo de creación de items.
/// - `Config` y `Other` cubren el resto.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
  /// Fallo de red o timeout del transporte.
  #[error("Error de transporte: {0}")]
  Transport(String),
  /// Respuesta HTTP no exitosa.
  #[error("Estado {status}: {message}")]
  Status { status: u16, message: String },
  /// Cuerpo de respuesta que no se pudo decodificar.
  #[error("Respuesta malformada: {0}")]
  Malformed(String),
  /// El endpoint rechazó la creación (cuerpo `{error}`).
  #[error("{0}")]
  Rejected(String),
  /// Validación local de la entrada.
  #[error("Error de validación: {0}")]
  Validation(String),
  /// Configuración ausente o inválida.
  #[error("Error de configuración: {0}")]
  Config(String),
  /// Otro tipo de error.
  #[error("Otro: {0}")]
  Other(String),
}

impl FeedError {
  /// `true` para las tres categorías de fallo de carga (red, estado, cuerpo).
  pub fn is_fetch_failure(&self) -> bool {
    matches!(self, Self::Transport(_) | Self::Status { .. } | Self::Malformed(_))
  }
}

impl From<serde_json::Error> for FeedError {
  fn from(e: serde_json::Error) -> Self {
    Self::Malformed(e.to_string())
  }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, FeedError>;
