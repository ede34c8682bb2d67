use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CACHE_CONTROL;
use serde::de::DeserializeOwned;
use serde::Serialize;
use studio_logging::{studio_debug, studio_info};
use url::Url;

use crate::persist::VideoStore;
use crate::{
    DownloadError, GenerateRequest, GenerateResponse, JobStatusResponse, RegenerateRequest,
    RegenerateResponse, RenderRequest, RenderResponse, RequestError,
};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Bounds a whole video download, body included, in place of `request_timeout`.
    pub download_timeout: Duration,
}

impl ClientSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            // Generation waits on a language model; keep this generous.
            request_timeout: Duration::from_secs(120),
            download_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// The remote generation and rendering service.
#[async_trait::async_trait]
pub trait StudioApi: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, RequestError>;

    async fn regenerate(
        &self,
        request: &RegenerateRequest,
    ) -> Result<RegenerateResponse, RequestError>;

    /// Returns as soon as the job is queued, not when the video exists.
    async fn render(&self, request: &RenderRequest) -> Result<RenderResponse, RequestError>;

    /// Always hits the server; never served from a cache.
    async fn status(&self, job_id: &str) -> Result<JobStatusResponse, RequestError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestStudioClient {
    http: reqwest::Client,
    base_url: Url,
    download_timeout: Duration,
}

impl ReqwestStudioClient {
    pub fn new(settings: ClientSettings) -> Result<Self, RequestError> {
        if settings.base_url.cannot_be_a_base() {
            return Err(RequestError::new(format!(
                "invalid API base: {}",
                settings.base_url
            )));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(RequestError::network)?;
        Ok(Self {
            http,
            base_url: settings.base_url,
            download_timeout: settings.download_timeout,
        })
    }

    /// Where the finished video for `job_id` can be fetched. Pure; no request is made.
    pub fn video_location(&self, job_id: &str) -> Url {
        self.endpoint(&["video", job_id])
    }

    /// Streams the finished video into `store` and returns the saved path.
    pub async fn download_video(
        &self,
        job_id: &str,
        store: &VideoStore,
    ) -> Result<PathBuf, DownloadError> {
        let url = self.video_location(job_id);
        studio_info!("Downloading video job_id={} url={}", job_id, url);
        let response = self
            .http
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(RequestError::network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(RequestError::network)?;
            return Err(RequestError::from_status(status, body).into());
        }

        let mut pending = store.begin(job_id)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(RequestError::network)?;
            pending.write_chunk(&chunk)?;
        }
        let written = pending.written();
        let path = pending.commit()?;
        studio_info!("Saved video job_id={} bytes={} path={:?}", job_id, written, path);
        Ok(path)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T, RequestError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        studio_debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(RequestError::network)?;
        read_json(response).await
    }

    async fn get_json<T>(&self, segments: &[&str]) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        studio_debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(RequestError::network)?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl StudioApi for ReqwestStudioClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, RequestError> {
        self.post_json(&["generate"], request).await
    }

    async fn regenerate(
        &self,
        request: &RegenerateRequest,
    ) -> Result<RegenerateResponse, RequestError> {
        self.post_json(&["regenerate"], request).await
    }

    async fn render(&self, request: &RenderRequest) -> Result<RenderResponse, RequestError> {
        self.post_json(&["render"], request).await
    }

    async fn status(&self, job_id: &str) -> Result<JobStatusResponse, RequestError> {
        self.get_json(&["status", job_id]).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RequestError> {
    let status = response.status();
    let body = response.text().await.map_err(RequestError::network)?;
    if !status.is_success() {
        return Err(RequestError::from_status(status, body));
    }
    serde_json::from_str(&body).map_err(RequestError::malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ReqwestStudioClient {
        let base_url = Url::parse(base).unwrap();
        ReqwestStudioClient::new(ClientSettings::new(base_url)).unwrap()
    }

    #[test]
    fn video_location_is_deterministic() {
        let client = client("http://localhost:8000");
        assert_eq!(
            client.video_location("abc").as_str(),
            "http://localhost:8000/video/abc"
        );
        assert_eq!(client.video_location("abc"), client.video_location("abc"));
    }

    #[test]
    fn base_path_is_preserved() {
        let client = client("https://studio.example.com/api/");
        assert_eq!(
            client.endpoint(&["status", "j1"]).as_str(),
            "https://studio.example.com/api/status/j1"
        );
    }

    #[test]
    fn job_id_is_a_single_segment() {
        let client = client("http://localhost:8000");
        assert_eq!(
            client.video_location("a/b").as_str(),
            "http://localhost:8000/video/a%2Fb"
        );
    }

    #[test]
    fn rejects_non_hierarchical_base() {
        let base_url = Url::parse("mailto:studio@example.com").unwrap();
        assert!(ReqwestStudioClient::new(ClientSettings::new(base_url)).is_err());
    }
}
