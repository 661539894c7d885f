use std::{
    collections::HashSet,
    sync::Mutex,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    secrecy::ExposeSecret,
    serde::Serialize,
    serde_json::{Value, json},
    tracing::{debug, info},
};

use crate::{
    config::StoreConfig,
    error::{Error, Result},
    record::ImageRecord,
};

const INSERT_IMAGE_SQL: &str = "INSERT INTO images (post_id, file_id, origin_id, caption, tags, \
                                source, width, height, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// What happened to a `save_image` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The remote write was issued and accepted.
    Saved,
    /// This post id was already written during this process lifetime; the
    /// remote write was suppressed.
    Duplicate,
    /// Store credentials are not configured; the write was silently skipped.
    Skipped,
}

/// Request body for the D1 query endpoint.
#[derive(Serialize)]
struct D1Query<'a> {
    sql: &'a str,
    params: Vec<Value>,
}

/// Client for the D1 HTTP query endpoint.
///
/// Holds the dedup cache: post ids seen in this process. The cache is never
/// evicted and carries no cross-process guarantee; external duplicates are the
/// store's problem.
pub struct D1Client {
    http: reqwest::Client,
    config: StoreConfig,
    seen: Mutex<HashSet<String>>,
}

impl D1Client {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config,
            seen: Mutex::new(HashSet::new()),
        })
    }

    /// Insert one provenance row. At-most-once: no retry on failure.
    pub async fn save_image(&self, record: &ImageRecord) -> Result<SaveOutcome> {
        {
            let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
            if !seen.insert(record.post_id.clone()) {
                debug!(post_id = %record.post_id, "post id already saved, suppressing remote write");
                return Ok(SaveOutcome::Duplicate);
            }
        }

        if self.config.api_token.expose_secret().is_empty() || self.config.database_id.is_empty() {
            debug!(
                post_id = %record.post_id,
                "store credentials not configured, skipping write"
            );
            return Ok(SaveOutcome::Skipped);
        }

        let params = vec![
            json!(record.post_id),
            json!(record.preview_ref),
            json!(record.origin_ref),
            json!(record.caption),
            json!(record.tags),
            json!(record.source),
            json!(record.width),
            json!(record.height),
            json!(epoch_secs()),
        ];
        self.execute(INSERT_IMAGE_SQL, params).await?;

        info!(post_id = %record.post_id, "image record saved");
        Ok(SaveOutcome::Saved)
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<()> {
        let url = format!(
            "{}/client/v4/accounts/{}/d1/database/{}/query",
            self.config.api_url.trim_end_matches('/'),
            self.config.account_id,
            self.config.database_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_token.expose_secret())
            .json(&D1Query { sql, params })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Persist-time timestamp, whole seconds since the Unix epoch.
fn epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
