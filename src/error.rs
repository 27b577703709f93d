//! Error taxonomy shared by the persistence and PDF layers. The UI wraps these
//! in `anyhow` for context, but the library surface stays typed so callers can
//! tell a missing record apart from a broken template.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Top-level error returned by the storage and export entry points.
#[derive(Debug, Error)]
pub enum CallSheetError {
    #[error("Call sheet '{0}' not found.")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("filesystem error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Call sheet '{name}' is not readable: {source}")]
    Corrupt {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Call sheet '{name}' could not be encoded: {source}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl CallSheetError {
    /// Attach the offending path to an `io::Error`.
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        CallSheetError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Problems with user-entered data. Messages are phrased for the status bar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required.")]
    Required(&'static str),

    #[error("{field} must be {expected} (got '{value}').")]
    Format {
        field: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("A call sheet holds at most {max} filming locations.")]
    TooManyLocations { max: usize },

    #[error("'{0}' is not a valid call sheet name.")]
    InvalidName(String),
}

/// Failures while loading a template or substituting record fields into it.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template field '{0}' is empty on this call sheet.")]
    MissingField(String),

    #[error("Template references unknown field '{0}'.")]
    UnknownField(String),

    #[error("Unclosed placeholder in template text '{0}'.")]
    Unclosed(String),

    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse template {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures inside the PDF document library or while embedding images.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("failed to load logo {}: {source}", path.display())]
    Logo {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::Pdf(err.to_string())
    }
}

pub type Result<T, E = CallSheetError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_and_corrupt_read_differently() {
        let encode = CallSheetError::Encode {
            name: "day-1".into(),
            source: serde_json::from_str::<u8>("x").unwrap_err(),
        };
        let corrupt = CallSheetError::Corrupt {
            name: "day-1".into(),
            source: serde_json::from_str::<u8>("x").unwrap_err(),
        };
        assert!(encode.to_string().starts_with("Call sheet 'day-1' could not be encoded"));
        assert!(corrupt.to_string().starts_with("Call sheet 'day-1' is not readable"));
    }
}
