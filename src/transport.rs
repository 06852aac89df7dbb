use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::errors::RestoreError;
use crate::types::{
    BackupVersion, DetailResponse, RestoreOptions, RestoreResponse, RestoreResult, Size,
    VersionDetail, VersionListResponse,
};

#[mockall::automock]
#[async_trait]
pub trait RestoreTransport: Send + Sync {
    async fn list_versions(&self, app_id: &str) -> Result<Vec<BackupVersion>>;
    async fn fetch_detail(&self, backup_id: &str) -> Result<VersionDetail>;
    async fn submit_restore(
        &self,
        app_id: &str,
        backup_id: &str,
        options: &RestoreOptions,
    ) -> Result<RestoreResult>;
}

pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Server URL cannot be used as a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl RestoreTransport for HttpTransport {
    async fn list_versions(&self, app_id: &str) -> Result<Vec<BackupVersion>> {
        let url = self.endpoint(&["restore", app_id, "versions"])?;
        debug!(%url, "listing backup versions");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to list backup versions: {}",
                response.status()
            ));
        }

        let body: VersionListResponse = response.json().await?;
        Ok(body.versions)
    }

    async fn fetch_detail(&self, backup_id: &str) -> Result<VersionDetail> {
        let url = self.endpoint(&["restore", "details", backup_id])?;
        debug!(%url, "fetching backup details");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Server answered {}", response.status()));
        }

        let body: DetailResponse = response.json().await?;
        if !body.success {
            return Err(RestoreError::rejected(body.error.as_deref()).into());
        }

        Ok(VersionDetail {
            backup_id: backup_id.to_string(),
            timestamp: body.timestamp.unwrap_or_else(|| "Unknown".to_string()),
            size: body.size.unwrap_or(Size::Bytes(0)),
            notes: body.notes,
            paths: body.paths,
        })
    }

    async fn submit_restore(
        &self,
        app_id: &str,
        backup_id: &str,
        options: &RestoreOptions,
    ) -> Result<RestoreResult> {
        let url = self.endpoint(&["restore", app_id, backup_id])?;
        info!(%url, ?options, "submitting restore");

        let response = self
            .client
            .post(url)
            .form(&options.form_fields())
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Restore request failed: {}", error_text));
        }

        let body: RestoreResponse = response.json().await?;
        Ok(body
            .result
            .unwrap_or_else(|| RestoreResult::failed("Unknown error")))
    }
}

/// Reads go to the server, restores are only simulated.
pub struct DryRunTransport<T: RestoreTransport> {
    inner: T,
}

impl<T: RestoreTransport> DryRunTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: RestoreTransport> RestoreTransport for DryRunTransport<T> {
    async fn list_versions(&self, app_id: &str) -> Result<Vec<BackupVersion>> {
        self.inner.list_versions(app_id).await
    }

    async fn fetch_detail(&self, backup_id: &str) -> Result<VersionDetail> {
        self.inner.fetch_detail(backup_id).await
    }

    async fn submit_restore(
        &self,
        app_id: &str,
        backup_id: &str,
        options: &RestoreOptions,
    ) -> Result<RestoreResult> {
        info!(app_id, backup_id, ?options, "dry run: restore not sent");
        Ok(RestoreResult::succeeded())
    }
}
