//! Shared blocking transport for both APIs.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Certificate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{self, ApiError, Result};
use crate::sanitize;
use crate::throttle::Throttle;

/// Connection settings for one API host.
#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub base_url: String,
    pub timeout: Duration,
    /// Client-side rate limit; 0 disables it.
    pub calls_per_second: f64,
    pub verify_ssl: bool,
    /// PEM bundle added to the trusted roots.
    pub ca_bundle: Option<PathBuf>,
}

impl HttpSettings {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(30),
            calls_per_second: 10.0,
            verify_ssl: true,
            ca_bundle: None,
        }
    }
}

pub(crate) struct Transport {
    client: Client,
    base_url: String,
    throttle: Throttle,
    token: Option<String>,
}

impl Transport {
    pub(crate) fn new(settings: &HttpSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_ssl);

        if let Some(path) = &settings.ca_bundle {
            let pem = std::fs::read(path).map_err(|e| {
                ApiError::Config(format!("cannot read CA bundle {}: {e}", path.display()))
            })?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| ApiError::Config(format!("invalid CA bundle: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            throttle: Throttle::new(settings.calls_per_second),
            token: None,
        })
    }

    pub(crate) fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request carrying the session header once a token is known.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Session {token}")),
            None => builder,
        }
    }

    /// Unauthenticated request, for the login endpoints.
    pub(crate) fn bare(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send and return the body of a successful response.
    pub(crate) fn execute(&self, req: RequestBuilder, what: &str) -> Result<String> {
        self.throttle.wait();
        debug!("{what}");

        let resp = req
            .send()
            .map_err(|e| ApiError::Connection(format!("{what} failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| ApiError::Decode(format!("{what}: failed to read body: {e}")))?;

        debug!("{what} -> {status}: {}", sanitize::for_log(&body));

        if !status.is_success() {
            return Err(error::from_status(status, &body));
        }
        Ok(body)
    }

    pub(crate) fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let body = self.execute(req, what)?;
        decode(&body, what)
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let req = self.request(Method::GET, path);
        self.send_json(req, &format!("GET {path}"))
    }

    pub(crate) fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let req = self.request(Method::GET, path).query(query);
        self.send_json(req, &format!("GET {path}"))
    }

    pub(crate) fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.with_body(Method::POST, path, body)
    }

    pub(crate) fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.with_body(Method::PUT, path, body)
    }

    fn with_body<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let what = format!("{method} {path}");
        if log::log_enabled!(log::Level::Debug) {
            if let Ok(json) = serde_json::to_value(body) {
                debug!("{what} body: {}", sanitize::sanitize(&json));
            }
        }
        let req = self.request(method, path).json(body);
        self.send_json(req, &what)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(format!("{what}: {e}")))
}

/// Pull a string field out of a login response.
pub(crate) fn token_field(body: &str, key: &str) -> Result<String> {
    let json: Value = decode(body, "login")?;
    json.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Auth(format!("login response did not include {key}")))
}
