//! Canonical request primitives for `AWS4-HMAC-SHA256`.
//!
//! Signer and verifier both build their bytes from these functions, so
//! the two sides cannot drift apart.

use std::fmt;

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Hex SHA-256 of the empty payload.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Percent-encode with the RFC 3986 unreserved set.
pub fn uri_encode(input: &[u8], encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Decode `%XX` escapes. Malformed escapes are kept literally.
pub fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Normalise a request path into the form sent on the wire.
///
/// Dot segments are removed and every segment is re-encoded once, so
/// equivalent spellings (`%7E` vs `~`) produce the same bytes.
pub fn normalize_path(path: &str) -> String {
    let trailing_slash = path.len() > 1 && path.ends_with('/');
    let mut segments: Vec<String> = Vec::new();

    for segment in path.split('/') {
        // Dot segments are recognised after decoding; `%2E%2E` is `..`.
        let decoded = percent_decode(segment);
        match decoded.as_slice() {
            b"" | b"." => {}
            b".." => {
                segments.pop();
            }
            other => segments.push(uri_encode(other, true)),
        }
    }

    let mut normalized = String::from("/");
    normalized.push_str(&segments.join("/"));
    if trailing_slash && !segments.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Canonical URI for an already-normalised path.
///
/// Every service except S3 encodes the wire path a second time.
pub fn canonical_uri(normalized_path: &str, double_encode: bool) -> String {
    if double_encode {
        uri_encode(normalized_path.as_bytes(), false)
    } else {
        normalized_path.to_string()
    }
}

/// Whether `service` signs a double-encoded path.
pub fn double_encodes(service: &str) -> bool {
    service != "s3"
}

/// Canonical query string from decoded pairs.
pub fn canonical_query(pairs: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (uri_encode(k.as_bytes(), true), uri_encode(v.as_bytes(), true)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Trim and collapse internal whitespace runs.
fn canonical_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical header block and signed-header list for `names`.
///
/// `names` must be lower-case; they are sorted here. Names absent from
/// `headers` are skipped.
pub fn canonical_headers(headers: &HeaderMap, names: &[&str]) -> (String, String) {
    let mut names: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| headers.contains_key(*n))
        .collect();
    names.sort_unstable();
    names.dedup();

    let mut block = String::new();
    for name in &names {
        let values: Vec<String> = headers
            .get_all(*name)
            .iter()
            .map(|v| canonical_header_value(&String::from_utf8_lossy(v.as_bytes())))
            .collect();
        block.push_str(name);
        block.push(':');
        block.push_str(&values.join(","));
        block.push('\n');
    }

    (block, names.join(";"))
}

/// Hex SHA-256 of a payload.
pub fn hash_payload(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// The canonical request, rendered with `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub method: String,
    pub uri: String,
    pub query: String,
    pub headers: String,
    pub signed_headers: String,
    pub payload_hash: String,
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method.to_ascii_uppercase(),
            self.uri,
            self.query,
            self.headers,
            self.signed_headers,
            self.payload_hash
        )
    }
}

/// `date/region/service/aws4_request`.
pub fn credential_scope(date: &str, region: &str, service: &str) -> String {
    format!("{}/{}/{}/aws4_request", date, region, service)
}

/// String to sign over a canonical request.
pub fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hash_payload(canonical_request.as_bytes())
    )
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Derive the scoped signing key from the secret.
pub fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Hex signature of a string to sign.
pub fn signature(signing_key: &[u8], string_to_sign: &str) -> String {
    hex::encode(hmac_sha256(signing_key, string_to_sign.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode(b"a b/c~d", false), "a%20b/c~d");
        assert_eq!(uri_encode(b"a b/c~d", true), "a%20b%2Fc~d");
        assert_eq!(uri_encode("ü".as_bytes(), true), "%C3%BC");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b"), b"a b");
        assert_eq!(percent_decode("100%"), b"100%");
        assert_eq!(percent_decode("%zz"), b"%zz");
        assert_eq!(percent_decode("%7e"), b"~");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/search"), "/search");
        assert_eq!(normalize_path("/a/./b/../c/"), "/a/c/");
        assert_eq!(normalize_path("/%7Euser/a%20b"), "/~user/a%20b");
        assert_eq!(normalize_path("/static//themes"), "/static/themes");
        assert_eq!(normalize_path("/a/%2E%2E/b"), "/b");
        assert_eq!(normalize_path("/a/%2e/b"), "/a/b");
        assert_eq!(normalize_path("/a/.%2E/b/"), "/b/");
        assert_eq!(normalize_path("/a/%2E%2E%2E"), "/a/...");
    }

    #[test]
    fn test_canonical_uri_double_encodes() {
        assert_eq!(canonical_uri("/a%20b", true), "/a%2520b");
        assert_eq!(canonical_uri("/a%20b", false), "/a%20b");
    }

    #[test]
    fn test_canonical_query_sorted() {
        let pairs = vec![
            ("q".to_string(), "rust lang".to_string()),
            ("category".to_string(), "general".to_string()),
            ("a".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ];
        assert_eq!(canonical_query(&pairs), "a=1&a=2&category=general&q=rust%20lang");
        assert_eq!(canonical_query(&[]), "");
    }

    #[test]
    fn test_canonical_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("example.amazonaws.com"));
        headers.insert("x-amz-date", HeaderValue::from_static("20150830T123600Z"));
        headers.append("my-header", HeaderValue::from_static("  value   with  spaces "));
        headers.append("my-header", HeaderValue::from_static("second"));

        let (block, signed) = canonical_headers(&headers, &["x-amz-date", "host", "my-header", "absent"]);
        assert_eq!(signed, "host;my-header;x-amz-date");
        assert_eq!(
            block,
            "host:example.amazonaws.com\nmy-header:value with spaces,second\nx-amz-date:20150830T123600Z\n"
        );
    }

    #[test]
    fn test_empty_payload_hash() {
        assert_eq!(hash_payload(b""), EMPTY_PAYLOAD_SHA256);
    }

    #[test]
    fn test_signing_key_published_vector() {
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_get_vanilla_vector() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("example.amazonaws.com"));
        headers.insert("x-amz-date", HeaderValue::from_static("20150830T123600Z"));
        let (block, signed) = canonical_headers(&headers, &["host", "x-amz-date"]);

        let canonical = CanonicalRequest {
            method: "GET".into(),
            uri: canonical_uri(&normalize_path("/"), true),
            query: canonical_query(&[]),
            headers: block,
            signed_headers: signed,
            payload_hash: EMPTY_PAYLOAD_SHA256.into(),
        };

        let scope = credential_scope("20150830", "us-east-1", "service");
        let sts = string_to_sign("20150830T123600Z", &scope, &canonical.to_string());
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20150830",
            "us-east-1",
            "service",
        );

        assert_eq!(
            signature(&key, &sts),
            "5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
    }
}
