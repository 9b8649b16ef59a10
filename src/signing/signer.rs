//! Request signer.
//!
//! # Responsibilities
//! - Turn a forward-request draft into a signed, immutable request
//! - Bind the signature to the resolved target authority
//! - Pick the scope region according to the configured policy
//!
//! # Design Decisions
//! - Pure function of its inputs, timestamp included; no I/O
//! - `SignedRequest` exposes no mutators; it is consumed on transmission

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::http::header::{AUTHORIZATION, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;

use crate::config::RegionPolicy;
use crate::http::request::InboundRequest;
use crate::routing::ResolvedOrigin;
use crate::security::headers::forwardable_request_headers;
use crate::signing::canonical::{
    self, canonical_headers, canonical_query, canonical_uri, credential_scope, derive_signing_key,
    hash_payload, normalize_path, string_to_sign, CanonicalRequest, ALGORITHM,
};
use crate::signing::identity::SigningIdentity;

pub const X_AMZ_DATE: &str = "x-amz-date";
pub const X_AMZ_CONTENT_SHA256: &str = "x-amz-content-sha256";
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

/// Headers bound into the signature when present.
const SIGNED_HEADER_CANDIDATES: &[&str] = &[
    "content-type",
    "host",
    X_AMZ_CONTENT_SHA256,
    X_AMZ_DATE,
    X_AMZ_SECURITY_TOKEN,
];

/// Why a draft could not be signed. Never transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// The supplied timestamp cannot be expressed in the signing format.
    #[error("signing timestamp is invalid")]
    ClockSkew,

    /// The identity lacks a required field.
    #[error("signing identity is invalid: {0}")]
    InvalidIdentity(&'static str),

    /// A value could not be carried in an HTTP header.
    #[error("cannot encode {0} as a header value")]
    InvalidHeader(&'static str),
}

/// What will be sent to the backend, before signing.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestDraft {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: Vec<(String, String)>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            query,
            headers,
            body,
        }
    }

    /// Draft carrying the inbound method, path, query and body, with the
    /// headers allowed to cross to the backend.
    pub fn from_inbound(request: &InboundRequest, routing_header: Option<&HeaderName>) -> Self {
        Self::new(
            request.method().clone(),
            request.path(),
            request.query().to_vec(),
            forwardable_request_headers(request.headers(), routing_header),
            request.body().clone(),
        )
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// A signed request. Valid only for exactly these bytes.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: Method,
    origin: ResolvedOrigin,
    path: String,
    query: String,
    headers: HeaderMap,
    body: Bytes,
    scope: String,
    signed_headers: String,
    signature: String,
}

impl SignedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn origin(&self) -> &ResolvedOrigin {
        &self.origin
    }

    /// Normalised path as sent on the wire.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Canonical query string as sent on the wire.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn credential_scope(&self) -> &str {
        &self.scope
    }

    pub fn signed_headers(&self) -> &str {
        &self.signed_headers
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Full target URL.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            format!("{}{}", self.origin, self.path)
        } else {
            format!("{}{}?{}", self.origin, self.path, self.query)
        }
    }

    /// Consume into method, URL, headers and body for transmission.
    pub fn into_parts(self) -> (Method, String, HeaderMap, Bytes) {
        let url = self.url();
        (self.method, url, self.headers, self.body)
    }

    /// Consume into an `http::Request`.
    pub fn into_http_request(self) -> Result<Request<Bytes>, axum::http::Error> {
        let (method, url, headers, body) = self.into_parts();
        let mut request = Request::builder().method(method).uri(url).body(body)?;
        *request.headers_mut() = headers;
        Ok(request)
    }
}

/// Signs drafts for one service under a region policy.
#[derive(Debug, Clone)]
pub struct Signer {
    service: String,
    region_policy: RegionPolicy,
}

impl Signer {
    pub fn new(service: impl Into<String>, region_policy: RegionPolicy) -> Self {
        Self {
            service: service.into(),
            region_policy,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Region bound into the credential scope for `target`.
    pub fn scope_region(&self, identity: &SigningIdentity, target: &ResolvedOrigin) -> String {
        match self.region_policy {
            RegionPolicy::Deployment => identity.region().to_string(),
            RegionPolicy::Origin => target
                .region_hint()
                .unwrap_or_else(|| identity.region().to_string()),
        }
    }

    /// Sign `draft` for delivery to `target` at time `now`.
    pub fn sign(
        &self,
        draft: RequestDraft,
        identity: &SigningIdentity,
        target: &ResolvedOrigin,
        now: SystemTime,
    ) -> Result<SignedRequest, SigningError> {
        identity.validate()?;
        let time = signing_time(now)?;
        let amz_date = time.format("%Y%m%dT%H%M%SZ").to_string();
        let date = time.format("%Y%m%d").to_string();
        let region = self.scope_region(identity, target);

        let path = normalize_path(&draft.path);
        let query = canonical_query(&draft.query);
        let payload_hash = hash_payload(&draft.body);

        let mut headers = draft.headers;
        headers.insert(HOST, header_value(target.authority().as_str(), "host")?);
        headers.insert(X_AMZ_DATE, header_value(&amz_date, X_AMZ_DATE)?);
        headers.insert(X_AMZ_CONTENT_SHA256, header_value(&payload_hash, X_AMZ_CONTENT_SHA256)?);
        if let Some(token) = identity.session_token() {
            headers.insert(X_AMZ_SECURITY_TOKEN, header_value(token, X_AMZ_SECURITY_TOKEN)?);
        }

        let (header_block, signed_headers) = canonical_headers(&headers, SIGNED_HEADER_CANDIDATES);
        let canonical_request = CanonicalRequest {
            method: draft.method.as_str().to_string(),
            uri: canonical_uri(&path, canonical::double_encodes(&self.service)),
            query: query.clone(),
            headers: header_block,
            signed_headers: signed_headers.clone(),
            payload_hash,
        };

        let scope = credential_scope(&date, &region, &self.service);
        let to_sign = string_to_sign(&amz_date, &scope, &canonical_request.to_string());
        let key = derive_signing_key(identity.secret_access_key(), &date, &region, &self.service);
        let signature = canonical::signature(&key, &to_sign);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            identity.access_key_id(),
            scope,
            signed_headers,
            signature
        );
        headers.insert(AUTHORIZATION, header_value(&authorization, "authorization")?);

        Ok(SignedRequest {
            method: draft.method,
            origin: target.clone(),
            path,
            query,
            headers,
            body: draft.body,
            scope,
            signed_headers,
            signature,
        })
    }
}

fn header_value(value: &str, name: &'static str) -> Result<HeaderValue, SigningError> {
    HeaderValue::from_str(value).map_err(|_| SigningError::InvalidHeader(name))
}

fn signing_time(now: SystemTime) -> Result<DateTime<Utc>, SigningError> {
    let since_epoch = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| SigningError::ClockSkew)?;
    let secs = i64::try_from(since_epoch.as_secs()).map_err(|_| SigningError::ClockSkew)?;
    let time = DateTime::<Utc>::from_timestamp(secs, 0).ok_or(SigningError::ClockSkew)?;
    if time.year() > 9999 {
        return Err(SigningError::ClockSkew);
    }
    Ok(time)
}
