//! Error types for stencil-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from registry operations.
///
/// Looking up an unknown template is not an error; [`get`] returns `None`.
///
/// [`get`]: crate::registry::TemplateRegistry::get
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure while reading a catalogue file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse catalogue at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The catalogue file did not exist at the expected path.
    #[error("catalogue not found at {path}")]
    CatalogueNotFound { path: PathBuf },

    /// A template name must be non-empty.
    #[error("template name must not be empty")]
    EmptyName,
}
