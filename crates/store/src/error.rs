use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Non-success response from the query endpoint. Carries the status and
    /// raw body for operator-facing diagnostics.
    #[error("record store error: HTTP {status}: {body}")]
    Remote { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, Error>;
