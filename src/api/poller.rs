use reqwest::StatusCode;
use std::time::Duration;

use crate::{
    error::{PixVaultError, Result},
    models::{decode_data_uri, ContentPath, ContentStatus, ImageResult},
    transport::Transport,
};

/// Number of status calls a poll may issue: `ceil(timeout / interval)`, at
/// least one.
pub fn attempt_budget(timeout: Duration, interval: Duration) -> u32 {
    let interval = interval.as_millis().max(1);
    let attempts = timeout.as_millis().div_ceil(interval);
    attempts.clamp(1, u32::MAX as u128) as u32
}

/// Sequential status polling for one content path.
///
/// Each attempt is a single GET on `content/request-json/{path}`. The loop
/// stops on the first 200 that yields bytes, on any status other than
/// 200/202, or once the attempt budget is used up. Dropping the returned
/// future stops it before the next attempt.
pub struct Poller<'a> {
    transport: &'a Transport,
    interval: Duration,
}

impl<'a> Poller<'a> {
    pub fn new(transport: &'a Transport, interval: Duration) -> Self {
        Self {
            transport,
            interval,
        }
    }

    pub async fn wait_for(
        &self,
        content_path: &ContentPath,
        label: &str,
        timeout: Duration,
    ) -> Result<ImageResult> {
        let status_path = format!("content/request-json/{}", content_path);
        let budget = attempt_budget(timeout, self.interval);
        log::info!(
            "{} {} (up to {} attempts every {:?})",
            label,
            content_path,
            budget,
            self.interval
        );

        for attempt in 1..=budget {
            let (status, body) = self.transport.raw_get(&status_path).await?;
            match status {
                StatusCode::OK => {
                    if let Some(data) = self.resolve(content_path, &body).await? {
                        log::info!("{} {} ready after {} attempt(s)", label, content_path, attempt);
                        return Ok(ImageResult {
                            data,
                            url: self.transport.cdn_url(content_path.as_str()),
                            content_path: content_path.clone(),
                        });
                    }
                }
                StatusCode::ACCEPTED => {
                    log::debug!("{} {}: still processing ({}/{})", label, content_path, attempt, budget);
                }
                other => {
                    log::error!("{} {} failed with status {}", label, content_path, other.as_u16());
                    return Err(PixVaultError::OperationFailed {
                        label: label.to_string(),
                        status: other.as_u16(),
                        body,
                    });
                }
            }

            if attempt < budget {
                tokio::time::sleep(self.interval).await;
            }
        }

        log::warn!("{} {} timed out after {} attempts", label, content_path, budget);
        Err(PixVaultError::OperationTimedOut {
            label: label.to_string(),
            timeout,
            url: self.transport.endpoint(&status_path),
        })
    }

    /// Embedded payload first, CDN copy second. `None` means neither was
    /// usable yet.
    async fn resolve(&self, content_path: &ContentPath, body: &str) -> Result<Option<Vec<u8>>> {
        let status: ContentStatus = serde_json::from_str(body).unwrap_or_default();
        if let Some(uri) = status.inline_data() {
            return decode_data_uri(uri).map(Some);
        }

        match self.transport.fetch_image(content_path.as_str()).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                log::warn!("CDN fetch for {} failed: {}", content_path, e);
                Ok(None)
            }
        }
    }
}
