use std::env;
use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use url::Url;

use crate::error::{Error, Result};
use crate::sse::process_sse;
use crate::types::{ChatCompletionChunk, ChatCompletionRequest, ErrorResponse};

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the provider base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A boxed stream of chat completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// A language-model service that answers a chat request incrementally.
///
/// [`OpenAi`] is the production implementation; anything that can produce a
/// [`ChunkStream`] can stand in for it.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Open one streaming request.
    ///
    /// Errors during request setup are returned directly; errors after the
    /// stream has started arrive as `Err` items of the stream.
    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<ChunkStream>;
}

/// Client for an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAi {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl OpenAi {
    /// Create a new client.
    ///
    /// The API key can be provided directly or read from the `OPENAI_API_KEY`
    /// environment variable.  The base URL is taken from `OPENAI_BASE_URL` when
    /// set.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let base_url = env::var(BASE_URL_ENV).ok().filter(|url| !url.is_empty());
        Self::with_options(api_key, base_url, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "{API_KEY_ENV} environment variable is not set"
                    ))
                })?,
        };

        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let parsed = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .map(|response| response.error);
        let error_type = parsed.as_ref().and_then(|e| e.error_type.clone());
        let error_code = parsed.as_ref().and_then(|e| e.code.clone());
        let error_param = parsed.as_ref().and_then(|e| e.param.clone());
        let error_message = parsed
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or(error_body);

        // Map HTTP status code to appropriate error type
        match status_code {
            400 => Error::bad_request(error_message, error_param),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_type.or(error_code), error_message),
        }
    }

    /// Send a chat completion request and get a streaming response.
    ///
    /// Returns a stream of chunks that can be processed incrementally.  The
    /// `stream` flag of the request is forced on.
    pub async fn stream(&self, mut request: ChatCompletionRequest) -> Result<ChunkStream> {
        request.stream = true;

        let url = self.base_url.join("chat/completions")?;
        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {e}"),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        Ok(Box::pin(process_sse(response.bytes_stream())))
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAi {
    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
        self.stream(request).await
    }
}

/// Parse a base URL, making sure it ends in `/` so that joining relative
/// endpoint paths keeps the last path segment.
fn parse_base_url(base_url: &str) -> Result<Url> {
    if base_url.ends_with('/') {
        Ok(Url::parse(base_url)?)
    } else {
        Ok(Url::parse(&format!("{base_url}/"))?)
    }
}
