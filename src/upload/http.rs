use super::{check_remote_name, UploadError, Uploader};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{header, Client, ClientBuilder};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_BUCKET: &str = "scrapedesk";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("scrapedesk/", env!("CARGO_PKG_VERSION"));

/// Credential material read from a JSON key file.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    access_token: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, UploadError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            UploadError::MissingCredentials(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, UploadError> {
        let credentials: Credentials = serde_json::from_str(raw)
            .map_err(|e| UploadError::MalformedCredentials(e.to_string()))?;
        if credentials.access_token.trim().is_empty() {
            return Err(UploadError::MalformedCredentials(
                "access_token is empty".to_string(),
            ));
        }
        Ok(credentials)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub endpoint: Url,
    pub bucket: String,
    pub credentials_path: PathBuf,
    pub timeout: Duration,
}

impl UploadConfig {
    pub fn new(endpoint: Url, credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            endpoint,
            bucket: DEFAULT_BUCKET.to_string(),
            credentials_path: credentials_path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `SCRAPEDESK_UPLOAD_ENDPOINT`, `SCRAPEDESK_UPLOAD_BUCKET` and
    /// `SCRAPEDESK_CREDENTIALS`. Returns `Ok(None)` when no endpoint is set.
    pub fn from_env() -> Result<Option<Self>, UploadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, UploadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(endpoint) = lookup("SCRAPEDESK_UPLOAD_ENDPOINT") else {
            return Ok(None);
        };
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| UploadError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        let credentials_path = lookup("SCRAPEDESK_CREDENTIALS").ok_or_else(|| {
            UploadError::MissingCredentials("SCRAPEDESK_CREDENTIALS is not set".to_string())
        })?;

        let mut config = Self::new(endpoint, credentials_path);
        if let Some(bucket) = lookup("SCRAPEDESK_UPLOAD_BUCKET") {
            config = config.with_bucket(bucket);
        }
        Ok(Some(config))
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

/// Uploads artifacts with an authenticated `PUT {endpoint}/{bucket}/{name}`.
#[derive(Clone)]
pub struct HttpUploader {
    client: Client,
    endpoint: Url,
    bucket: String,
    credentials: Credentials,
}

impl fmt::Debug for HttpUploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpUploader")
            .field("endpoint", &self.endpoint.as_str())
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl HttpUploader {
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        let credentials = Credentials::from_file(&config.credentials_path)?;
        Self::with_credentials(config, credentials)
    }

    /// Builds an uploader from [`UploadConfig::from_env`], failing when no
    /// endpoint is configured.
    pub fn from_env() -> Result<Self, UploadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, UploadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = UploadConfig::from_lookup(lookup)?.ok_or_else(|| {
            UploadError::InvalidEndpoint("SCRAPEDESK_UPLOAD_ENDPOINT is not set".to_string())
        })?;
        Self::new(config)
    }

    pub fn with_credentials(
        config: UploadConfig,
        credentials: Credentials,
    ) -> Result<Self, UploadError> {
        if config.endpoint.cannot_be_a_base() {
            return Err(UploadError::InvalidEndpoint(config.endpoint.to_string()));
        }
        check_remote_name(&config.bucket)?;

        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            bucket: config.bucket,
            credentials,
        })
    }

    fn object_url(&self, remote_name: &str) -> Result<Url, UploadError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| UploadError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(&self.bucket)
            .push(remote_name);
        Ok(url)
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, remote_name: &str, body: Vec<u8>) -> Result<String, UploadError> {
        check_remote_name(remote_name)?;
        let url = self.object_url(remote_name)?;
        debug!("Uploading {} bytes to {}", body.len(), url);

        let response = self
            .client
            .put(url.clone())
            .bearer_auth(&self.credentials.access_token)
            .header(header::CONTENT_TYPE, content_type_for(remote_name))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let shared = serde_json::from_str::<UploadResponse>(&text)
            .ok()
            .and_then(|r| r.url)
            .unwrap_or_else(|| url.to_string());
        info!("Uploaded {} to {}", remote_name, shared);
        Ok(shared)
    }
}

fn content_type_for(remote_name: &str) -> &'static str {
    match Path::new(remote_name).extension().and_then(|e| e.to_str()) {
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uploader(server: &MockServer) -> HttpUploader {
        let config = UploadConfig::new(Url::parse(&server.uri()).unwrap(), "unused.json")
            .with_bucket("crawler-configs");
        HttpUploader::with_credentials(config, Credentials::new("secret-token")).unwrap()
    }

    #[tokio::test]
    async fn upload_puts_body_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/crawler-configs/web_scraper_config_20240501_120000.json"))
            .and(header("authorization", "Bearer secret-token"))
            .and(header("content-type", "application/json"))
            .and(body_bytes(b"{}".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = uploader(&server)
            .upload("web_scraper_config_20240501_120000.json", b"{}".to_vec())
            .await
            .unwrap();

        assert_eq!(
            url,
            format!(
                "{}/crawler-configs/web_scraper_config_20240501_120000.json",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn upload_prefers_url_from_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_string(r#"{"url": "https://share.example/abc"}"#),
            )
            .mount(&server)
            .await;

        let url = uploader(&server).upload("a.json", b"{}".to_vec()).await.unwrap();
        assert_eq!(url, "https://share.example/abc");
    }

    #[tokio::test]
    async fn rejected_upload_reports_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad token"))
            .mount(&server)
            .await;

        let err = uploader(&server)
            .upload("a.json", b"{}".to_vec())
            .await
            .unwrap_err();
        match err {
            UploadError::Rejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "bad token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_rejects_nested_names_without_sending() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = uploader(&server)
            .upload("../a.json", b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidName(_)));
    }

    #[test]
    fn missing_credential_file_is_reported() {
        let config = UploadConfig::new(
            Url::parse("https://upload.example").unwrap(),
            "/nonexistent/credentials.json",
        );
        let err = HttpUploader::new(config).unwrap_err();
        assert!(matches!(err, UploadError::MissingCredentials(_)));
    }

    #[test]
    fn malformed_credentials_are_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"client_email": "x"}"#).unwrap();
        let err = Credentials::from_file(&path).unwrap_err();
        assert!(matches!(err, UploadError::MalformedCredentials(_)));

        std::fs::write(&path, r#"{"access_token": "  "}"#).unwrap();
        let err = Credentials::from_file(&path).unwrap_err();
        assert!(matches!(err, UploadError::MalformedCredentials(_)));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let rendered = format!("{:?}", Credentials::new("secret-token"));
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SCRAPEDESK_UPLOAD_ENDPOINT", "https://upload.example/api"),
            ("SCRAPEDESK_CREDENTIALS", "/etc/scrapedesk/key.json"),
            ("SCRAPEDESK_UPLOAD_BUCKET", "team-configs"),
        ]);
        let config = UploadConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(config.endpoint.as_str(), "https://upload.example/api");
        assert_eq!(config.bucket, "team-configs");
        assert_eq!(config.credentials_path, PathBuf::from("/etc/scrapedesk/key.json"));
    }

    #[test]
    fn config_from_lookup_without_endpoint_is_none() {
        assert!(UploadConfig::from_lookup(|_| None).unwrap().is_none());
    }

    #[test]
    fn uploader_from_lookup_requires_an_endpoint() {
        let err = HttpUploader::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, UploadError::InvalidEndpoint(_)));
    }

    #[test]
    fn config_from_lookup_requires_credentials() {
        let err = UploadConfig::from_lookup(|k| {
            (k == "SCRAPEDESK_UPLOAD_ENDPOINT").then(|| "https://upload.example".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, UploadError::MissingCredentials(_)));
    }
}
