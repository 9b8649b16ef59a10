//! Signature verification, as performed by the backend.
//!
//! Rebuilds the canonical request from what actually arrived and compares
//! signatures in constant time. Used by tests and local mock backends to
//! prove the gateway's output is accepted by the scheme.

use axum::body::Bytes;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::http::request::parse_query;
use crate::signing::canonical::{
    self, canonical_headers, canonical_query, canonical_uri, credential_scope, derive_signing_key,
    hash_payload, string_to_sign, CanonicalRequest, ALGORITHM,
};
use crate::signing::identity::SigningIdentity;
use crate::signing::signer::{X_AMZ_CONTENT_SHA256, X_AMZ_DATE};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("missing header: {0}")]
    MissingHeader(String),

    #[error("malformed authorization header")]
    MalformedAuthorization,

    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,

    #[error("unknown access key")]
    UnknownAccessKey,

    #[error("credential scope does not match")]
    ScopeMismatch,

    #[error("payload hash does not match body")]
    PayloadMismatch,

    #[error("signature does not match")]
    SignatureMismatch,
}

/// Parsed `authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    pub access_key_id: String,
    pub date: String,
    pub region: String,
    pub service: String,
    pub signed_headers: Vec<String>,
    pub signature: String,
}

impl AuthorizationHeader {
    pub fn parse(value: &str) -> Result<Self, VerifyError> {
        let rest = value
            .strip_prefix(ALGORITHM)
            .ok_or(VerifyError::UnsupportedAlgorithm)?;

        let mut credential = None;
        let mut signed_headers = None;
        let mut signature = None;
        for part in rest.split(',') {
            let (key, val) = part
                .trim()
                .split_once('=')
                .ok_or(VerifyError::MalformedAuthorization)?;
            match key {
                "Credential" => credential = Some(val),
                "SignedHeaders" => signed_headers = Some(val),
                "Signature" => signature = Some(val),
                _ => return Err(VerifyError::MalformedAuthorization),
            }
        }

        let credential = credential.ok_or(VerifyError::MalformedAuthorization)?;
        let parts: Vec<&str> = credential.split('/').collect();
        let [access_key_id, date, region, service, terminator] = parts.as_slice() else {
            return Err(VerifyError::MalformedAuthorization);
        };
        if *terminator != "aws4_request" {
            return Err(VerifyError::MalformedAuthorization);
        }

        Ok(Self {
            access_key_id: access_key_id.to_string(),
            date: date.to_string(),
            region: region.to_string(),
            service: service.to_string(),
            signed_headers: signed_headers
                .ok_or(VerifyError::MalformedAuthorization)?
                .split(';')
                .map(str::to_string)
                .collect(),
            signature: signature
                .ok_or(VerifyError::MalformedAuthorization)?
                .to_string(),
        })
    }
}

/// Verify a signed request against `identity` for `service`.
pub fn verify(
    request: &Request<Bytes>,
    identity: &SigningIdentity,
    service: &str,
) -> Result<(), VerifyError> {
    let headers = request.headers();
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| VerifyError::MissingHeader("authorization".into()))?;
    let auth = AuthorizationHeader::parse(authorization)?;

    if auth.access_key_id != identity.access_key_id() {
        return Err(VerifyError::UnknownAccessKey);
    }
    if auth.region != identity.region() || auth.service != service {
        return Err(VerifyError::ScopeMismatch);
    }

    let amz_date = headers
        .get(X_AMZ_DATE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| VerifyError::MissingHeader(X_AMZ_DATE.into()))?;
    if !amz_date.starts_with(&auth.date) {
        return Err(VerifyError::ScopeMismatch);
    }

    let payload_hash = hash_payload(request.body());
    if let Some(claimed) = headers.get(X_AMZ_CONTENT_SHA256) {
        if claimed.as_bytes() != payload_hash.as_bytes() {
            return Err(VerifyError::PayloadMismatch);
        }
    }

    let names: Vec<&str> = auth.signed_headers.iter().map(String::as_str).collect();
    if let Some(missing) = names.iter().find(|n| !headers.contains_key(**n)) {
        return Err(VerifyError::MissingHeader(missing.to_string()));
    }
    let (header_block, signed_headers) = canonical_headers(headers, &names);

    let query = request.uri().query().map(parse_query).unwrap_or_default();
    let canonical_request = CanonicalRequest {
        method: request.method().as_str().to_string(),
        uri: canonical_uri(request.uri().path(), canonical::double_encodes(service)),
        query: canonical_query(&query),
        headers: header_block,
        signed_headers,
        payload_hash,
    };

    let scope = credential_scope(&auth.date, &auth.region, &auth.service);
    let to_sign = string_to_sign(amz_date, &scope, &canonical_request.to_string());
    let key = derive_signing_key(identity.secret_access_key(), &auth.date, &auth.region, service);
    let expected = canonical::signature(&key, &to_sign);

    if bool::from(expected.as_bytes().ct_eq(auth.signature.as_bytes())) {
        Ok(())
    } else {
        Err(VerifyError::SignatureMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authorization() {
        let auth = AuthorizationHeader::parse(
            "AWS4-HMAC-SHA256 Credential=AKID/20150830/us-east-1/lambda/aws4_request, SignedHeaders=host;x-amz-date, Signature=abcd",
        )
        .unwrap();

        assert_eq!(auth.access_key_id, "AKID");
        assert_eq!(auth.date, "20150830");
        assert_eq!(auth.region, "us-east-1");
        assert_eq!(auth.service, "lambda");
        assert_eq!(auth.signed_headers, vec!["host", "x-amz-date"]);
        assert_eq!(auth.signature, "abcd");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            AuthorizationHeader::parse("Bearer token"),
            Err(VerifyError::UnsupportedAlgorithm)
        );
        assert_eq!(
            AuthorizationHeader::parse("AWS4-HMAC-SHA256 Credential=AKID/20150830, Signature=x"),
            Err(VerifyError::MalformedAuthorization)
        );
    }

    #[test]
    fn test_missing_authorization() {
        let request = Request::builder()
            .uri("https://a.example.com/")
            .body(Bytes::new())
            .unwrap();
        let identity = SigningIdentity::new("AKID", "s", None, "us-east-1");
        assert_eq!(
            verify(&request, &identity, "lambda"),
            Err(VerifyError::MissingHeader("authorization".into()))
        );
    }
}
