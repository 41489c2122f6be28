//! HTTP implementation of [`TriageApi`].
//!
//! Talks JSON to the triage backend service:
//! - `GET  /api/auth/me` for the session check
//! - `GET  /api/emails/` for the item list
//! - `GET  /api/categories/` and `GET /api/folders/` for read-only lookups
//! - `POST /api/emails/{id}/reclassify`, `POST /api/emails/confirm-all`
//! - `POST /api/categories/{id}/batch-move`, `POST /api/categories/{id}/batch-delete`
//! - `GET  /api/undo/actions` and `POST /api/undo/actions/{id}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{
    ApiError, ApiResult, AuthStatus, DeleteResult, EmailFilter, EmailPage, Identity, MoveResult,
    TriageApi,
};
use crate::domain::{
    Bucket, Category, CategoryId, ConfirmSummary, Correction, EmailId, EmailItem, Folder,
    RecentAction,
};

/// Upper bound the backend enforces on the undo list.
const MAX_RECENT_ACTIONS: u32 = 5;

#[derive(Debug, Serialize)]
struct ReclassifyBody<'a> {
    category_id: &'a CategoryId,
}

#[derive(Debug, Serialize)]
struct ConfirmAllBody<'a> {
    bucket: &'a Bucket,
    corrections: &'a [Correction],
}

#[derive(Debug, Serialize)]
struct CreateFolderBody<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecentActionsResponse {
    actions: Vec<RecentAction>,
}

/// Triage backend client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTriageApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpTriageApi {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Request`] if the URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Request(format!("invalid backend URL {}: {}", base_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Request(format!("http client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    /// Returns the backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Request(format!("invalid endpoint {}: {}", path, e)))
    }

    /// Makes a GET request and decodes the JSON response.
    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let response = self
            .client
            .get(self.url(path)?)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .query(query)
            .send()
            .await
            .map_err(connection_error)?;

        Self::handle_response(response).await
    }

    /// Makes a POST request with a JSON body and decodes the JSON response.
    async fn post<T: for<'de> Deserialize<'de>, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .client
            .post(self.url(path)?)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(body)
            .send()
            .await
            .map_err(connection_error)?;

        Self::handle_response(response).await
    }

    /// Checks the status and decodes the body.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Request(format!("invalid response: {}", e)))
    }
}

fn connection_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Request("request timed out".to_string())
    } else {
        ApiError::Request(format!("connection error: {}", e))
    }
}

fn filter_query(filter: &EmailFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(folder) = &filter.folder {
        query.push(("folder", folder.clone()));
    }
    if let Some(status) = &filter.status {
        query.push(("status", status.clone()));
    }
    if let Some(limit) = filter.limit {
        query.push(("limit", limit.to_string()));
    }
    if let Some(offset) = filter.offset {
        query.push(("offset", offset.to_string()));
    }
    query
}

#[async_trait]
impl TriageApi for HttpTriageApi {
    async fn check_auth(&self) -> ApiResult<AuthStatus> {
        match self.get::<Identity>("/api/auth/me", &[]).await {
            Ok(identity) => Ok(AuthStatus {
                authenticated: true,
                identity: Some(identity),
            }),
            Err(ApiError::AuthRequired) => Ok(AuthStatus::default()),
            Err(e) => Err(e),
        }
    }

    async fn fetch_emails(&self, filter: &EmailFilter) -> ApiResult<EmailPage> {
        self.get("/api/emails/", &filter_query(filter)).await
    }

    async fn fetch_categories(&self, bucket: Option<Bucket>) -> ApiResult<Vec<Category>> {
        let query: Vec<(&str, String)> = bucket
            .map(|b| vec![("master_category", b.0)])
            .unwrap_or_default();
        self.get("/api/categories/", &query).await
    }

    async fn fetch_folders(&self) -> ApiResult<Vec<Folder>> {
        self.get("/api/folders/", &[]).await
    }

    async fn create_folder(&self, name: &str) -> ApiResult<Folder> {
        self.post("/api/folders/", &CreateFolderBody { name }).await
    }

    async fn reclassify_email(
        &self,
        id: &EmailId,
        category_id: &CategoryId,
    ) -> ApiResult<EmailItem> {
        let path = format!("/api/emails/{}/reclassify", id);
        self.post(&path, &ReclassifyBody { category_id }).await
    }

    async fn confirm_all_in_view(
        &self,
        bucket: &Bucket,
        corrections: &[Correction],
    ) -> ApiResult<ConfirmSummary> {
        self.post(
            "/api/emails/confirm-all",
            &ConfirmAllBody {
                bucket,
                corrections,
            },
        )
        .await
    }

    async fn batch_move_to_folder(&self, category_id: &CategoryId) -> ApiResult<MoveResult> {
        let path = format!("/api/categories/{}/batch-move", category_id);
        self.post(&path, &serde_json::json!({})).await
    }

    async fn batch_delete_category(&self, category_id: &CategoryId) -> ApiResult<DeleteResult> {
        let path = format!("/api/categories/{}/batch-delete", category_id);
        self.post(&path, &serde_json::json!({})).await
    }

    async fn recent_actions(&self, limit: u32) -> ApiResult<Vec<RecentAction>> {
        let limit = limit.min(MAX_RECENT_ACTIONS);
        let response: RecentActionsResponse = self
            .get("/api/undo/actions", &[("limit", limit.to_string())])
            .await?;
        Ok(response.actions)
    }

    async fn undo_action(&self, action_id: &str) -> ApiResult<()> {
        let path = format!("/api/undo/actions/{}", action_id);
        let _: serde_json::Value = self.post(&path, &serde_json::json!({})).await?;
        Ok(())
    }
}
