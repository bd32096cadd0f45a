//! The HTTP side of GraphQL: one POST per operation to the endpoint of the chosen service.

use crate::{
    Error, Result,
    router::{Endpoints, Service},
};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, time::Duration};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    #[serde(skip_serializing_if = "std::option::Option::is_none")]
    pub operation_name: Option<String>,
    pub query: String,
    pub variables: Map<String, Value>,
}

impl GraphQlRequest {
    pub fn new<Q: Into<String>>(
        operation_name: Option<&str>,
        query: Q,
        variables: Map<String, Value>,
    ) -> Self {
        Self {
            operation_name: operation_name.map(String::from),
            query: query.into(),
            variables,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn from_errors<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data: None,
            errors: messages
                .into_iter()
                .map(|m| GraphQlError {
                    message: m.into(),
                    ..Default::default()
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub path: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl GraphQlError {
    pub fn locations_display(&self) -> String {
        self.locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn path_display(&self) -> String {
        self.path
            .iter()
            .map(|p| match p {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Sends a GraphQL request to a service. The bearer token, when there is one, is attached as
/// an `Authorization` header; without one the request goes out unauthenticated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        service: Service,
        request: &GraphQlRequest,
        token: Option<String>,
    ) -> Result<GraphQlResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpTransport {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoints })
    }

    #[inline]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn headers(token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::auth(format!("Invalid token format: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        service: Service,
        request: &GraphQlRequest,
        token: Option<String>,
    ) -> Result<GraphQlResponse> {
        let url = self.endpoints.url(service);
        debug!(
            "POST {url} ({})",
            request.operation_name.as_deref().unwrap_or("anonymous")
        );
        let response = self
            .client
            .post(url)
            .headers(Self::headers(token.as_deref())?)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        // GraphQL servers report most failures in the body, whatever the status code.
        match serde_json::from_str::<GraphQlResponse>(&body) {
            Ok(parsed) if status.is_success() || !parsed.errors.is_empty() => Ok(parsed),
            _ if !status.is_success() => Err(Error::status(url, status.as_u16(), &body)),
            parsed => Ok(parsed?),
        }
    }
}
