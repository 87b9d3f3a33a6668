//! Errors surfaced by `gobarber` commands.

use gobarber::alert::Alert;
use gobarber::forms::FieldErrors;
use gobarber::{ApiError, SessionError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid API URL `{0}`; expected http:// or https://")]
    InvalidApiUrl(String),
    #[error("could not determine a data directory; pass --store or set GOBARBER_STORE")]
    NoDataDir,
    #[error("not signed in; run `gobarber sign-in` first")]
    NotSignedIn,
    #[error("invalid date `{0}`; expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("{hour:02}:00 is not available on that day")]
    HourUnavailable { hour: u8 },
    #[error("invalid input: {0}")]
    Invalid(FieldErrors),
    #[error("{alert} ({detail})")]
    Rejected { alert: Alert, detail: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CliError {
    /// Wrap a backend failure in the alert the app would show for it.
    pub fn rejected(alert: Alert, detail: impl std::fmt::Display) -> Self {
        Self::Rejected { alert, detail: detail.to_string() }
    }
}
