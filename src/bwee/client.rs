use crate::app_config::Gateway;
use crate::bwee::ApiResult;
use crate::codec::{self, DecodeError, EncodeOptions};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};

pub const APPLICATION_KEY: &str = "application-key";
const PRODUCT: &str = "bwee";

/// REST client for the gateway. Clones share one lazily created HTTP session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    session: OnceCell<Client>,
    base_url: String,
    api_key: Option<String>,
    user_agent: String,
    request_timeout: Duration,
    max_bad_request_retries: u32,
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    base: Option<String>,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            base: None,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// Sends the request to another host than the configured gateway, e.g. `http://192.168.1.20:8080`.
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header, replacing the session default with the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl ApiClient {
    pub fn new(config: &Gateway) -> Self {
        ApiClient {
            inner: Arc::new(Inner {
                session: OnceCell::new(),
                base_url: config.base_url().unwrap_or_default(),
                api_key: config.api_key().map(str::to_string),
                user_agent: user_agent(config.host_label()),
                request_timeout: config.request_timeout(),
                max_bad_request_retries: config.max_bad_request_retries(),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    async fn session(&self) -> Result<&Client, ClientError> {
        self.inner
            .session
            .get_or_try_init(|| async { new_session(self.inner.api_key.as_deref(), &self.inner.user_agent) })
            .await
    }

    /// Sends a request and folds every outcome into an [`ApiResult`].
    ///
    /// A `400 Bad Request` is retried with the identical request, at most
    /// `max_bad_request_retries` times. Any other non-200 status, a transport error or an
    /// undecodable body yields a failure result with [`crate::bwee::LOCAL_FAILURE_CODE`].
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let base = request.base.as_deref().unwrap_or(&self.inner.base_url);
        let url = format!("{}{}", base, request.path);

        let session = match self.session().await {
            Ok(session) => session,
            Err(e) => return failure(&request.method, &url, e.to_string()),
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            info!(url = %url, query = ?request.query, body = ?request.body, "Http request, attempt {}", attempt);

            let mut builder = session
                .request(request.method.clone(), &url)
                .headers(request.headers.clone())
                .timeout(self.inner.request_timeout);
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => return failure(&request.method, &url, e.to_string()),
            };

            match response.status() {
                StatusCode::OK => {
                    let text = match response.text().await {
                        Ok(text) => text,
                        Err(e) => return failure(&request.method, &url, e.to_string()),
                    };
                    debug!(body = %text, "Http response");

                    return match codec::decode_str::<ApiResult<T>>(&text) {
                        Ok(mut result) => {
                            result.count_objects();
                            result
                        }
                        Err(e) => failure(&request.method, &url, e.to_string()),
                    };
                }
                StatusCode::BAD_REQUEST if attempt <= self.inner.max_bad_request_retries => {
                    warn!(url = %url, "⚠️ Gateway answered 400 Bad Request, retrying...");
                }
                status => return failure(&request.method, &url, format!("Response code: {}", status.as_u16())),
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Vec<(String, String)>) -> ApiResult<T> {
        self.send(ApiRequest::new(Method::GET, path).query(query)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        match json_body(body) {
            Ok(body) => self.send(ApiRequest::new(Method::POST, path).body(body)).await,
            Err(e) => failure(&Method::POST, path, e.to_string()),
        }
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        match json_body(body) {
            Ok(body) => self.send(ApiRequest::new(Method::PUT, path).body(body)).await,
            Err(e) => failure(&Method::PUT, path, e.to_string()),
        }
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, query: Vec<(String, String)>) -> ApiResult<T> {
        self.send(ApiRequest::new(Method::DELETE, path).query(query)).await
    }
}

fn json_body<B: Serialize>(body: &B) -> Result<Value, DecodeError> {
    codec::encode(body, EncodeOptions::default())
}

fn failure<T>(method: &Method, url: &str, message: String) -> ApiResult<T> {
    error!(%method, url, "❌ Error while sending request: {}", message);
    ApiResult::failure(message)
}

fn new_session(api_key: Option<&str>, user_agent: &str) -> Result<Client, ClientError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_str(user_agent)?);

    if let Some(api_key) = api_key {
        let mut application_key_value = HeaderValue::from_str(api_key)?;
        application_key_value.set_sensitive(true);
        headers.insert(APPLICATION_KEY, application_key_value);
    }

    let client = Client::builder().default_headers(headers).build()?;
    Ok(client)
}

fn user_agent(host_label: &str) -> String {
    format!(
        "{}/{} ({}; Rust; {} {})",
        PRODUCT,
        env!("CARGO_PKG_VERSION"),
        host_label,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("client set an invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}
