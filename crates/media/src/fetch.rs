//! Blob download from the transport's file storage.

use tracing::debug;

use crate::error::{Error, Result};

/// Download raw bytes for a file the transport has already resolved to a
/// storage path (`get_file` gives the path; this fetches the content).
///
/// The URL embeds the bot token, so it is never logged. Callers are expected
/// to construct `client` with a request timeout; every invocation inherits
/// that deadline.
pub async fn fetch_file(
    client: &reqwest::Client,
    api_url: &str,
    token: &str,
    file_path: &str,
) -> Result<Vec<u8>> {
    let url = format!(
        "{}/file/bot{}/{}",
        api_url.trim_end_matches('/'),
        token,
        file_path
    );

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|source| Error::Fetch { source })?;

    if !response.status().is_success() {
        return Err(Error::FetchStatus {
            status: response.status(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| Error::Fetch { source })?;
    debug!(file_path, bytes = bytes.len(), "downloaded transport blob");
    Ok(bytes.to_vec())
}
