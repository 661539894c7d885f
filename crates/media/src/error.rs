use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode image: {source}")]
    Decode {
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode preview: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },

    #[error("file download failed: {source}")]
    Fetch {
        #[source]
        source: reqwest::Error,
    },

    #[error("file download failed: HTTP {status}")]
    FetchStatus { status: reqwest::StatusCode },
}

pub type Result<T> = std::result::Result<T, Error>;
