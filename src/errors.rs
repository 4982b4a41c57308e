use std::path::PathBuf;
use thiserror::Error;

/// Structural configuration failures.
///
/// Anything recoverable (bad color, missing pixmap, unparsable font) is
/// absorbed and logged where it happens; only errors that must abort the
/// current load are surfaced through this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The built-in defaults file is gone. There is no usable configuration
    /// without it, so startup cannot continue.
    #[error("missing defaults file: {0}")]
    MissingDefaults(PathBuf),

    /// A required option has no value after merging every source.
    #[error("option '{0}' has no value after merging all configuration sources")]
    MissingRequiredOption(&'static str),

    /// The key theme override left a required option unset.
    #[error("option '{0}' has no value after applying the key theme")]
    MissingKeyThemeOption(&'static str),
}
