// HTTP response utilities for artifacts and Brotli-compressed text
use crate::domain::artifact::Artifact;
use async_compression::tokio::bufread::BrotliEncoder;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Response, StatusCode},
};
use serde::Serialize;
use tokio::io::AsyncReadExt;

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Whether the client accepts Brotli-encoded bodies.
pub fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

async fn brotli(bytes: Vec<u8>) -> std::io::Result<Vec<u8>> {
    let cursor = std::io::Cursor::new(bytes);
    let mut encoder = BrotliEncoder::new(cursor);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await?;
    Ok(compressed)
}

/// Text body, Brotli-compressed when the client asked for it.
pub async fn text_response(
    body: Vec<u8>,
    content_type: &'static str,
    compress: bool,
) -> Result<Response<Body>, StatusCode> {
    let original = body.len();
    let (body, content_encoding) = if compress {
        let compressed = brotli(body).await.map_err(|e| {
            tracing::error!("Brotli compression error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        tracing::debug!("Compressed {} -> {} bytes", original, compressed.len());
        (compressed, Some("br"))
    } else {
        (body, None)
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, body.len());
    if let Some(encoding) = content_encoding {
        builder = builder.header(header::CONTENT_ENCODING, encoding);
    }

    builder.body(Body::from(body)).map_err(|e| {
        tracing::error!("Response build error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub async fn svg_response(svg: String, compress: bool) -> Result<Response<Body>, StatusCode> {
    text_response(svg.into_bytes(), SVG_CONTENT_TYPE, compress).await
}

pub async fn json_response<T: Serialize>(value: &T, compress: bool) -> Result<Response<Body>, StatusCode> {
    let body = serde_json::to_vec(value).map_err(|e| {
        tracing::error!("JSON serialization error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    text_response(body, JSON_CONTENT_TYPE, compress).await
}

/// Binary download. PNG and PDF are already compressed, so no encoding is applied.
pub fn artifact_response(artifact: Artifact) -> Result<Response<Body>, StatusCode> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", artifact.filename))
        .map_err(|e| {
            tracing::error!("Invalid artifact filename {}: {}", artifact.filename, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.content_type())
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, artifact.bytes.len())
        .body(Body::from(artifact.bytes))
        .map_err(|e| {
            tracing::error!("Response build error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
