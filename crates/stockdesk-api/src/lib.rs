// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::Method;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::cookie::{CookieStore, Jar};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use stockdesk_app::{ApiError, Listing, Mutation};
use url::Url;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Blocking client for the back-office REST API.
///
/// Every endpoint answers with an envelope `{status, data?, message?}`;
/// anything but `status == "success"` is a rejection. Mutating requests
/// carry the `csrftoken` cookie value in `X-CSRFToken`.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    jar: Arc<Jar>,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let mut base_url =
            Url::parse(trimmed).with_context(|| format!("parse server base url {trimmed:?}"))?;
        if base_url.cannot_be_a_base() {
            bail!("server.base_url {trimmed:?} cannot be used as a base URL");
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        let http = HttpClient::builder()
            .timeout(timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            jar,
            http,
        })
    }

    /// Seeds the cookie jar from a `Cookie`-header style string
    /// (`sessionid=...; csrftoken=...`).
    pub fn with_session_cookie(self, cookie_header: &str) -> Self {
        for pair in cookie_header.split(';') {
            let pair = pair.trim();
            if pair.is_empty() || !pair.contains('=') {
                continue;
            }
            self.jar.add_cookie_str(pair, &self.base_url);
        }
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let raw = header.to_str().ok()?;
        raw.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == CSRF_COOKIE && !value.is_empty()).then(|| value.to_owned())
        })
    }

    pub fn list<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>> {
        let url = self.endpoint(resource, None)?;
        let data = self.send(self.http.get(url.clone()), &Method::GET, &url)?;
        let listing = required_data(data)
            .and_then(decode_listing)
            .with_context(|| format!("decode {resource} list"))?;
        Ok(listing.into_records())
    }

    pub fn list_page<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(String, String)],
    ) -> Result<Listing<T>> {
        let mut url = self.endpoint(resource, None)?;
        url.query_pairs_mut().extend_pairs(query);
        let data = self.send(self.http.get(url.clone()), &Method::GET, &url)?;
        required_data(data)
            .and_then(decode_listing)
            .with_context(|| format!("decode {resource} page"))
    }

    pub fn get<T: DeserializeOwned>(&self, resource: &str, id: i64) -> Result<T> {
        let url = self.endpoint(resource, Some(id))?;
        let envelope = self.send(self.http.get(url.clone()), &Method::GET, &url)?;
        required_data(envelope)
            .and_then(|data| {
                serde_json::from_value(data).map_err(|error| ApiError::Malformed(error.to_string()))
            })
            .with_context(|| format!("decode {resource} #{id}"))
    }

    pub fn create<B: Serialize>(&self, resource: &str, body: &B) -> Result<Mutation> {
        let url = self.endpoint(resource, None)?;
        let request = self.mutating(self.http.post(url.clone())).json(body);
        self.send(request, &Method::POST, &url).map(Envelope::into_mutation)
    }

    pub fn update<B: Serialize>(&self, resource: &str, id: i64, body: &B) -> Result<Mutation> {
        let url = self.endpoint(resource, Some(id))?;
        let request = self.mutating(self.http.put(url.clone())).json(body);
        self.send(request, &Method::PUT, &url).map(Envelope::into_mutation)
    }

    pub fn delete(&self, resource: &str, id: i64) -> Result<Mutation> {
        let url = self.endpoint(resource, Some(id))?;
        let request = self.mutating(self.http.delete(url.clone()));
        self.send(request, &Method::DELETE, &url).map(Envelope::into_mutation)
    }

    fn endpoint(&self, resource: &str, id: Option<i64>) -> Result<Url> {
        let path = match id {
            Some(id) => format!("api/{resource}/{id}/"),
            None => format!("api/{resource}/"),
        };
        self.base_url
            .join(&path)
            .with_context(|| format!("build URL for {path}"))
    }

    fn mutating(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::REFERER, self.base_url.as_str());
        match self.csrf_token() {
            Some(token) => request.header(CSRF_HEADER, token),
            None => {
                tracing::warn!("no {CSRF_COOKIE} cookie; sending without {CSRF_HEADER}");
                request
            }
        }
    }

    fn send(&self, request: RequestBuilder, method: &Method, url: &Url) -> Result<Envelope> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|error| ApiError::Transport(error.to_string()))
            .with_context(|| format!("{method} {}", url.path()))?;

        let status = response.status();
        tracing::debug!(%method, path = url.path(), status = status.as_u16(), "api response");
        let body = response
            .text()
            .map_err(|error| ApiError::Transport(error.to_string()))
            .with_context(|| format!("read {method} {} body", url.path()))?;

        if !status.is_success() {
            let error = ApiError::Status {
                code: status.as_u16(),
                message: error_message(&body),
            };
            return Err(error).with_context(|| format!("{method} {}", url.path()));
        }

        let envelope = decode_envelope(&body).with_context(|| format!("{method} {}", url.path()))?;
        match envelope.status.as_deref() {
            None | Some("success") => Ok(envelope),
            Some(other) => {
                tracing::debug!(status = other, "envelope rejected");
                Err(ApiError::Rejected {
                    message: envelope.message,
                })
                .with_context(|| format!("{method} {}", url.path()))
            }
        }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    fn into_mutation(self) -> Mutation {
        let id = self
            .data
            .as_ref()
            .and_then(|data| data.get("id"))
            .and_then(Value::as_i64);
        Mutation {
            id,
            message: self.message.filter(|message| !message.trim().is_empty()),
        }
    }
}

/// Reads never accept an envelope without `data`.
fn required_data(envelope: Envelope) -> std::result::Result<Value, ApiError> {
    envelope
        .data
        .ok_or_else(|| ApiError::Malformed("response has no data".to_owned()))
}

/// Empty 2xx bodies (e.g. `204 No Content`) count as success; a bare JSON
/// array is treated as the `data` of an implicit envelope. An object must
/// carry `status` or `data`.
fn decode_envelope(body: &str) -> std::result::Result<Envelope, ApiError> {
    if body.trim().is_empty() {
        return Ok(Envelope::default());
    }
    let value: Value =
        serde_json::from_str(body).map_err(|error| ApiError::Malformed(error.to_string()))?;
    match value {
        Value::Array(_) => Ok(Envelope {
            data: Some(value),
            ..Envelope::default()
        }),
        Value::Object(ref map) if map.contains_key("status") || map.contains_key("data") => {
            serde_json::from_value(value).map_err(|error| ApiError::Malformed(error.to_string()))
        }
        Value::Object(_) => Err(ApiError::Malformed(
            "response object has neither status nor data".to_owned(),
        )),
        other => Err(ApiError::Malformed(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

#[derive(serde::Deserialize)]
struct Page<T> {
    results: Vec<T>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    total_pages: Option<u32>,
}

fn decode_listing<T: DeserializeOwned>(data: Value) -> std::result::Result<Listing<T>, ApiError> {
    match data {
        Value::Array(_) => serde_json::from_value(data)
            .map(Listing::Flat)
            .map_err(|error| ApiError::Malformed(error.to_string())),
        Value::Object(ref map) if map.contains_key("results") => {
            let page: Page<T> = serde_json::from_value(data)
                .map_err(|error| ApiError::Malformed(error.to_string()))?;
            let count = page.count.unwrap_or(page.results.len() as u64);
            Ok(Listing::Paged {
                count,
                total_pages: page.total_pages,
                results: page.results,
            })
        }
        other => Err(ApiError::Malformed(format!(
            "expected a list or a page object, got {other}"
        ))),
    }
}

/// Pulls a human message out of an error body; plain text and HTML pages
/// yield nothing.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "detail", "error"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_owned)
    })
}
