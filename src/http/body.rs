use crate::error::GitWireError;
use actix_web::http::header;
use actix_web::{web, HttpRequest};
use bytes::{Bytes, BytesMut};
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use std::io::Read;

/// Buffer the whole request body, inflating `Content-Encoding: gzip`
/// before anything is decoded. The services are request/response, not
/// streaming, so partial feeds are never attempted.
pub(crate) async fn collect_body(
    req: &HttpRequest,
    mut payload: web::Payload,
) -> Result<Bytes, GitWireError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|err| GitWireError::Payload(err.to_string()))?;
        buf.extend_from_slice(&chunk);
    }
    if !is_gzip(req) {
        return Ok(buf.freeze());
    }
    let mut decoder = GzDecoder::new(&buf[..]);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|err| GitWireError::InvalidGzipBody(err.to_string()))?;
    Ok(Bytes::from(inflated))
}

fn is_gzip(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.eq_ignore_ascii_case("gzip"))
        .unwrap_or(false)
}
