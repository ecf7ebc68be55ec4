//! Writing computed products to HTTP responses.
//!
//! Metadata is sent as a bare JSON document. Every other product is a
//! `multipart/mixed` body: the metadata JSON first, then one
//! `application/octet-stream` part per data block.

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use seisgate_storage::CacheEntry;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{CacheStatus, Computed};

/// Reports whether the product was served from the compute cache.
pub const CACHE_HEADER: HeaderName = HeaderName::from_static("x-cache");

const JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// Single JSON document.
pub fn metadata_response(computed: Computed) -> Response {
    let response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON))],
        computed.entry.metadata.clone(),
    )
        .into_response();
    tag(response, computed.cache)
}

/// Metadata part followed by the data blocks, in order.
pub fn multipart_response(computed: Computed) -> ApiResult<Response> {
    let boundary = Uuid::now_v7().simple().to_string();
    let content_type = HeaderValue::from_str(&format!("multipart/mixed; boundary={}", boundary))
        .map_err(|e| ApiError::internal_error(format!("Invalid multipart boundary: {}", e)))?;

    let body = multipart_body(&boundary, &computed.entry);
    let response = (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response();
    Ok(tag(response, computed.cache))
}

fn tag(mut response: Response, cache: CacheStatus) -> Response {
    response
        .headers_mut()
        .insert(CACHE_HEADER, HeaderValue::from_static(cache.as_str()));
    response.extensions_mut().insert(cache);
    response
}

fn multipart_body(boundary: &str, entry: &CacheEntry) -> Vec<u8> {
    let framing = 64 + boundary.len();
    let mut body = Vec::with_capacity(entry.size_in_bytes() + framing * (entry.data.len() + 2));
    write_part(&mut body, boundary, JSON, &entry.metadata);
    for block in &entry.data {
        write_part(&mut body, boundary, OCTET_STREAM, block);
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

fn write_part(body: &mut Vec<u8>, boundary: &str, content_type: &str, content: &[u8]) {
    body.extend_from_slice(format!("--{}\r\nContent-Type: {}\r\n\r\n", boundary, content_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
}
