use thiserror::Error;

/// Errors originating from the core module.
///
/// The per-frame path has no fatal errors by contract; these only surface
/// from configuration loading and validation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },
}
