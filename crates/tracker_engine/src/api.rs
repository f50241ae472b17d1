use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracker_logging::{tracker_debug, tracker_warn};
use url::Url;

use crate::{
    ApiError, ClientSettings, FailureKind, KeywordId, KeywordRecord, NewTask, SearchDetail,
    SearchRecord, SubmitAck, TaskRecord,
};
use crate::types::Envelope;

/// Read/write access to the remote task queue and keyword registry.
#[async_trait::async_trait]
pub trait TaskApi: Send + Sync {
    async fn create_task(&self, task: &NewTask) -> Result<SubmitAck, ApiError>;

    /// Non-terminal (and possibly recently finished) tasks, in server order.
    async fn active_tasks(&self) -> Result<Vec<TaskRecord>, ApiError>;

    async fn list_keywords(&self) -> Result<Vec<KeywordRecord>, ApiError>;

    async fn add_keyword(&self, keyword: &str) -> Result<SubmitAck, ApiError>;

    async fn toggle_keyword(&self, id: KeywordId) -> Result<SubmitAck, ApiError>;

    async fn delete_keyword(&self, id: KeywordId) -> Result<SubmitAck, ApiError>;

    async fn recent_searches(&self, limit: u32) -> Result<Vec<SearchRecord>, ApiError>;

    async fn search_detail(&self, id: u64) -> Result<SearchDetail, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTaskApi {
    client: reqwest::Client,
    root: Url,
}

impl ReqwestTaskApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let root = api_root(&settings.base_url, &settings.api_prefix)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, root })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.root
            .join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, ApiError> {
        tracker_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        Ok(read_envelope::<T>(response).await?.data)
    }

    async fn post<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<SubmitAck, ApiError> {
        tracker_debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope = read_envelope::<serde_json::Value>(response).await?;
        Ok(SubmitAck {
            message: envelope.message,
        })
    }

    async fn send_mutation(&self, request: reqwest::RequestBuilder) -> Result<SubmitAck, ApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        read_ack(response).await
    }
}

#[async_trait::async_trait]
impl TaskApi for ReqwestTaskApi {
    async fn create_task(&self, task: &NewTask) -> Result<SubmitAck, ApiError> {
        let url = self.endpoint("tasks")?;
        self.post(url, task).await
    }

    async fn active_tasks(&self) -> Result<Vec<TaskRecord>, ApiError> {
        let url = self.endpoint("tasks/active")?;
        // A successful reply without `data` means nothing is active.
        Ok(self.get(url).await?.unwrap_or_default())
    }

    async fn list_keywords(&self) -> Result<Vec<KeywordRecord>, ApiError> {
        let url = self.endpoint("keywords")?;
        Ok(self.get(url).await?.unwrap_or_default())
    }

    async fn add_keyword(&self, keyword: &str) -> Result<SubmitAck, ApiError> {
        let url = self.endpoint("keywords")?;
        let body = serde_json::json!({ "keyword": keyword });
        self.post(url, &body).await
    }

    async fn toggle_keyword(&self, id: KeywordId) -> Result<SubmitAck, ApiError> {
        let url = self.endpoint(&format!("keywords/{id}/toggle"))?;
        self.send_mutation(self.client.patch(url)).await
    }

    async fn delete_keyword(&self, id: KeywordId) -> Result<SubmitAck, ApiError> {
        let url = self.endpoint(&format!("keywords/{id}"))?;
        self.send_mutation(self.client.delete(url)).await
    }

    async fn recent_searches(&self, limit: u32) -> Result<Vec<SearchRecord>, ApiError> {
        let mut url = self.endpoint("searches")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        Ok(self.get(url).await?.unwrap_or_default())
    }

    async fn search_detail(&self, id: u64) -> Result<SearchDetail, ApiError> {
        let url = self.endpoint(&format!("search/{id}"))?;
        self.get(url)
            .await?
            .ok_or_else(|| ApiError::new(FailureKind::Decode, "response carried no data"))
    }
}

/// Joins base URL and prefix into a root that ends with `/`.
fn api_root(base_url: &str, prefix: &str) -> Result<Url, ApiError> {
    let mut base = Url::parse(base_url.trim())
        .map_err(|err| ApiError::new(FailureKind::InvalidUrl, format!("{base_url}: {err}")))?;
    if base.cannot_be_a_base() {
        return Err(ApiError::new(
            FailureKind::InvalidUrl,
            format!("{base_url}: not a base url"),
        ));
    }
    let mut path = base.path().trim_end_matches('/').to_string();
    let prefix = prefix.trim_matches('/');
    if !prefix.is_empty() {
        path.push('/');
        path.push_str(prefix);
    }
    path.push('/');
    base.set_path(&path);
    Ok(base)
}

/// Decodes the response envelope; `success: false` becomes a rejection
/// carrying the server's own wording.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    match serde_json::from_slice::<Envelope<T>>(&body) {
        Ok(envelope) if envelope.success => Ok(envelope),
        Ok(envelope) => Err(rejection(status, envelope.error.or(envelope.message))),
        Err(err) if !status.is_success() => {
            tracker_debug!("Undecodable {} body: {}", status, err);
            Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ))
        }
        Err(err) => Err(ApiError::new(FailureKind::Decode, err.to_string())),
    }
}

/// Like [`read_envelope`] but tolerates empty or non-JSON 2xx bodies.
async fn read_ack(response: Response) -> Result<SubmitAck, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    match serde_json::from_slice::<Envelope<serde_json::Value>>(&body) {
        Ok(envelope) if envelope.success => Ok(SubmitAck {
            message: envelope.message,
        }),
        Ok(envelope) => Err(rejection(status, envelope.error.or(envelope.message))),
        Err(_) if status.is_success() => {
            if !body.is_empty() {
                tracker_warn!("Ignoring non-envelope {} body of {} bytes", status, body.len());
            }
            Ok(SubmitAck::default())
        }
        Err(_) => Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        )),
    }
}

fn rejection(status: StatusCode, reason: Option<String>) -> ApiError {
    let message = reason
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| format!("request failed ({status})"));
    ApiError::new(FailureKind::Rejected, message)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
