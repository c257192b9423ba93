//! REST client for the hosted document store
//!
//! Document URLs follow `<base>/collections/<collection>/documents[/<id>]`.
//! Every method maps a non-2xx response to an error; the sync engine
//! decides what a failure means for connectivity.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument};

use permitdesk_core::config::RemoteConfig;
use permitdesk_core::domain::{Submission, SubmissionId, SubmissionPatch};
use permitdesk_core::ports::{RemoteStore, RemoteSubscription};

/// Client for one document collection
#[derive(Debug, Clone)]
pub struct DocStoreClient {
    http: reqwest::Client,
    base_url: String,
    collection: String,
}

#[derive(Deserialize)]
struct DocumentList {
    documents: Vec<Submission>,
}

#[derive(Deserialize)]
struct CreatedDocument {
    id: SubmissionId,
}

impl DocStoreClient {
    /// Build a client from the remote section of the configuration
    ///
    /// # Errors
    /// Fails only when the underlying HTTP client cannot be constructed.
    pub fn from_config(config: &RemoteConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/collections/{}/documents",
            self.base_url, self.collection
        )
    }

    fn document_url(&self, id: &SubmissionId) -> String {
        format!("{}/{}", self.documents_url(), id)
    }
}

#[async_trait]
impl RemoteStore for DocStoreClient {
    /// Cheap reachability check against the collection endpoint
    #[instrument(skip(self))]
    async fn probe(&self) -> anyhow::Result<()> {
        self.http
            .get(self.documents_url())
            .query(&[("limit", "1")])
            .send()
            .await
            .context("Document store not reachable")?
            .error_for_status()
            .context("Document store refused the probe")?;
        Ok(())
    }

    /// Fetch the full collection, newest submissions first
    #[instrument(skip(self))]
    async fn fetch_all(&self) -> anyhow::Result<Vec<Submission>> {
        let list: DocumentList = self
            .http
            .get(self.documents_url())
            .query(&[("order", "submitted_at.desc")])
            .send()
            .await
            .context("Fetch request failed")?
            .error_for_status()
            .context("Fetch rejected")?
            .json()
            .await
            .context("Malformed document list")?;
        debug!(count = list.documents.len(), "Fetched documents");
        Ok(list.documents)
    }

    /// Create a document; returns the server-assigned identifier
    #[instrument(skip(self, submission), fields(temp_id = %submission.id))]
    async fn create(&self, submission: &Submission) -> anyhow::Result<SubmissionId> {
        let created: CreatedDocument = self
            .http
            .post(self.documents_url())
            .json(submission)
            .send()
            .await
            .context("Create request failed")?
            .error_for_status()
            .context("Create rejected")?
            .json()
            .await
            .context("Malformed create response")?;
        debug!(id = %created.id, "Document created");
        Ok(created.id)
    }

    /// Apply a partial update to one document
    #[instrument(skip(self, patch))]
    async fn update(&self, id: &SubmissionId, patch: &SubmissionPatch) -> anyhow::Result<()> {
        self.http
            .patch(self.document_url(id))
            .json(patch)
            .send()
            .await
            .context("Update request failed")?
            .error_for_status()
            .context("Update rejected")?;
        Ok(())
    }

    /// Delete one document; a missing document counts as deleted
    #[instrument(skip(self))]
    async fn delete(&self, id: &SubmissionId) -> anyhow::Result<()> {
        let response = self
            .http
            .delete(self.document_url(id))
            .send()
            .await
            .context("Delete request failed")?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(%id, "Document already absent");
            return Ok(());
        }
        response.error_for_status().context("Delete rejected")?;
        Ok(())
    }

    /// The REST transport has no push channel
    async fn subscribe(&self) -> anyhow::Result<RemoteSubscription> {
        anyhow::bail!("push subscriptions are not supported by the REST transport")
    }
}
