//! CloudFront origin-request event codec.
//!
//! # Responsibilities
//! - Decode a Lambda@Edge origin-request event into an `InboundRequest`
//! - Merge edge-configured custom origin headers into the request headers
//! - Encode an `EdgeResponse` as a generated CloudFront response
//!
//! # Design Decisions
//! - Custom origin headers override same-named viewer headers; routing
//!   metadata can only come from the distribution configuration
//! - A truncated body is refused; it cannot be signed faithfully
//! - Response bodies are always base64 so binary content survives

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::request::{InboundRequest, X_REQUEST_ID};
use crate::http::response::EdgeResponse;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event has no records")]
    NoRecords,

    #[error("invalid method '{0}'")]
    Method(String),

    #[error("invalid header '{0}'")]
    Header(String),

    #[error("body is not valid base64")]
    Body,

    #[error("request body was truncated by the edge")]
    BodyTruncated,
}

impl EventError {
    /// Status of the generated response for an undecodable event.
    pub fn status(&self) -> StatusCode {
        match self {
            EventError::BodyTruncated => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Top-level Lambda@Edge event.
#[derive(Debug, Deserialize)]
pub struct CloudFrontEvent {
    #[serde(rename = "Records")]
    pub records: Vec<CloudFrontRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CloudFrontRecord {
    pub cf: CloudFrontPayload,
}

#[derive(Debug, Deserialize)]
pub struct CloudFrontPayload {
    #[serde(default)]
    pub config: CloudFrontConfig,
    pub request: CloudFrontRequest,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFrontConfig {
    #[serde(default)]
    pub distribution_domain_name: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub request_id: String,
}

/// Headers keyed by lower-case name.
pub type CloudFrontHeaders = BTreeMap<String, Vec<HeaderEntry>>;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeaderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFrontRequest {
    #[serde(default)]
    pub client_ip: String,
    pub method: String,
    pub uri: String,
    #[serde(default)]
    pub querystring: String,
    #[serde(default)]
    pub headers: CloudFrontHeaders,
    #[serde(default)]
    pub body: Option<CloudFrontBody>,
    #[serde(default)]
    pub origin: Option<CloudFrontOrigin>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFrontBody {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub encoding: BodyEncoding,
    #[serde(default)]
    pub input_truncated: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    #[default]
    Base64,
    Text,
}

#[derive(Debug, Deserialize)]
pub struct CloudFrontOrigin {
    #[serde(default)]
    pub custom: Option<CustomOrigin>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOrigin {
    #[serde(default)]
    pub custom_headers: CloudFrontHeaders,
    #[serde(default)]
    pub domain_name: String,
}

impl CloudFrontEvent {
    pub fn from_slice(raw: &[u8]) -> Result<Self, EventError> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Decode the first record into an inbound request.
    pub fn into_inbound(self) -> Result<InboundRequest, EventError> {
        let record = self.records.into_iter().next().ok_or(EventError::NoRecords)?;
        let CloudFrontPayload { config, request } = record.cf;

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| EventError::Method(request.method.clone()))?;

        let mut headers = HeaderMap::new();
        append_headers(&mut headers, &request.headers)?;

        if let Some(custom) = request.origin.as_ref().and_then(|o| o.custom.as_ref()) {
            for name in custom.custom_headers.keys() {
                let name = parse_name(name)?;
                headers.remove(&name);
            }
            append_headers(&mut headers, &custom.custom_headers)?;
        }

        if !headers.contains_key(X_REQUEST_ID) && !config.request_id.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&config.request_id) {
                headers.insert(X_REQUEST_ID, value);
            }
        }

        let body = match request.body {
            Some(body) if body.input_truncated => return Err(EventError::BodyTruncated),
            Some(body) => match body.encoding {
                BodyEncoding::Base64 => Bytes::from(BASE64.decode(body.data).map_err(|_| EventError::Body)?),
                BodyEncoding::Text => Bytes::from(body.data),
            },
            None => Bytes::new(),
        };

        let query = (!request.querystring.is_empty()).then_some(request.querystring.as_str());
        Ok(InboundRequest::with_raw_query(method, request.uri.as_str(), query, headers, body))
    }
}

fn parse_name(name: &str) -> Result<HeaderName, EventError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| EventError::Header(name.to_string()))
}

fn append_headers(headers: &mut HeaderMap, source: &CloudFrontHeaders) -> Result<(), EventError> {
    for (name, entries) in source {
        let header = parse_name(name)?;
        for entry in entries {
            let value = HeaderValue::from_str(&entry.value)
                .map_err(|_| EventError::Header(name.clone()))?;
            headers.append(header.clone(), value);
        }
    }
    Ok(())
}

/// Generated response returned to CloudFront.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloudFrontResponse {
    pub status: String,
    pub status_description: String,
    pub headers: CloudFrontHeaders,
    pub body: String,
    pub body_encoding: BodyEncoding,
}

impl From<EdgeResponse> for CloudFrontResponse {
    fn from(response: EdgeResponse) -> Self {
        let mut headers = CloudFrontHeaders::new();
        for (name, value) in response.headers.iter() {
            // Non-UTF-8 values cannot be expressed in the event format.
            let Ok(value) = value.to_str() else {
                continue;
            };
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(HeaderEntry {
                    key: Some(display_case(name.as_str())),
                    value: value.to_string(),
                });
        }

        Self {
            status: response.status.as_u16().to_string(),
            status_description: response
                .status
                .canonical_reason()
                .unwrap_or_default()
                .to_string(),
            headers,
            body: BASE64.encode(&response.body),
            body_encoding: BodyEncoding::Base64,
        }
    }
}

/// `content-type` → `Content-Type`.
fn display_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"{
      "Records": [{
        "cf": {
          "config": {
            "distributionDomainName": "d111111abcdef8.cloudfront.net",
            "distributionId": "EDFDVBD6EXAMPLE",
            "eventType": "origin-request",
            "requestId": "4TyzHTaYWb1GX1qTfsHhEqV6HUDd"
          },
          "request": {
            "clientIp": "203.0.113.178",
            "method": "POST",
            "uri": "/search",
            "querystring": "q=rust+lang&format=json",
            "headers": {
              "host": [{"key": "Host", "value": "d111111abcdef8.cloudfront.net"}],
              "content-type": [{"key": "Content-Type", "value": "application/x-www-form-urlencoded"}],
              "target_origin": [{"key": "TARGET_ORIGIN", "value": "spoofed.example.com"}]
            },
            "body": {
              "action": "read-only",
              "data": "cT1ydXN0",
              "encoding": "base64",
              "inputTruncated": false
            },
            "origin": {
              "custom": {
                "customHeaders": {
                  "target_origin": [{"key": "TARGET_ORIGIN", "value": "abc.lambda-url.us-west-2.on.aws"}]
                },
                "domainName": "abc.lambda-url.us-west-2.on.aws",
                "keepaliveTimeout": 5,
                "path": "",
                "port": 443,
                "protocol": "https",
                "readTimeout": 30,
                "sslProtocols": ["TLSv1.2"]
              }
            }
          }
        }
      }]
    }"#;

    #[test]
    fn test_decode_origin_request() {
        let request = CloudFrontEvent::from_slice(EVENT.as_bytes())
            .unwrap()
            .into_inbound()
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.path(), "/search");
        assert_eq!(
            request.query(),
            &[
                ("q".to_string(), "rust lang".to_string()),
                ("format".to_string(), "json".to_string())
            ]
        );
        assert_eq!(request.body(), &Bytes::from_static(b"q=rust"));
        assert_eq!(request.request_id(), Some("4TyzHTaYWb1GX1qTfsHhEqV6HUDd"));

        // Edge-configured value replaces the viewer-supplied one.
        let targets: Vec<_> = request.headers().get_all("target_origin").iter().collect();
        assert_eq!(targets, vec!["abc.lambda-url.us-west-2.on.aws"]);
    }

    #[test]
    fn test_truncated_body_refused() {
        let event = EVENT.replace("\"inputTruncated\": false", "\"inputTruncated\": true");
        let err = CloudFrontEvent::from_slice(event.as_bytes())
            .unwrap()
            .into_inbound()
            .unwrap_err();
        assert!(matches!(err, EventError::BodyTruncated));
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_empty_records() {
        let err = CloudFrontEvent::from_slice(br#"{"Records": []}"#)
            .unwrap()
            .into_inbound()
            .unwrap_err();
        assert!(matches!(err, EventError::NoRecords));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_text_body_without_origin() {
        let event = r#"{"Records":[{"cf":{"request":{
            "method":"GET","uri":"/","querystring":"",
            "headers":{},
            "body":{"data":"plain","encoding":"text","inputTruncated":false}
        }}}]}"#;
        let request = CloudFrontEvent::from_slice(event.as_bytes())
            .unwrap()
            .into_inbound()
            .unwrap();
        assert_eq!(request.body(), &Bytes::from_static(b"plain"));
        assert!(request.query().is_empty());
    }

    #[test]
    fn test_encode_response() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/html"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let response = CloudFrontResponse::from(EdgeResponse {
            status: StatusCode::NOT_FOUND,
            headers,
            body: Bytes::from_static(b"missing"),
        });

        assert_eq!(response.status, "404");
        assert_eq!(response.status_description, "Not Found");
        assert_eq!(response.body, "bWlzc2luZw==");
        assert_eq!(response.headers["set-cookie"].len(), 2);
        assert_eq!(response.headers["content-type"][0].key.as_deref(), Some("Content-Type"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["bodyEncoding"], "base64");
        assert_eq!(json["statusDescription"], "Not Found");
    }
}
