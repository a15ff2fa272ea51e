use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the event engine.
///
/// Only initialisation problems and invariant violations propagate to the
/// top; impossible geometry during prediction is expressed as `Option`, and
/// capture-map drift is repaired in place rather than surfaced.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed configuration: unknown type tag, missing attribute,
    /// inconsistent ensemble, cutoff below the potential minimum.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Particles found inside a hard core at initialisation or after an
    /// event cycle.
    #[error("particle overlap: {0}")]
    Overlap(String),

    /// NaN in vector ops, or a negative discriminant where a positive one
    /// was expected. Fatal; the engine must not silently swallow this.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Malformed XML in a configuration document.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Propagated I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
