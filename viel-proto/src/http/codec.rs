use anyhow::Result;
use futures::stream::TryStreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header;
use hyper::{Response, StatusCode};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use tokio_util::io::ReaderStream;

pub(crate) type HttpBody = BoxBody<Bytes, std::io::Error>;
pub(crate) type HttpResponse = Response<HttpBody>;

pub(crate) fn text_body(txt: &'static str) -> HttpBody {
    BoxBody::new(Full::new(Bytes::from(txt)).map_err(|e| match e {}))
}

pub(crate) fn bytes_body(content: impl Into<Bytes>) -> HttpBody {
    BoxBody::new(Full::new(content.into()).map_err(|e| match e {}))
}

pub(crate) fn empty_body() -> HttpBody {
    BoxBody::new(Empty::<Bytes>::new().map_err(|e| match e {}))
}

/// Stream a file from disk without loading it in memory
pub(crate) fn file_body(file: tokio::fs::File) -> HttpBody {
    let stream = ReaderStream::new(file).map_ok(Frame::data);
    BoxBody::new(StreamBody::new(stream))
}

pub(crate) fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<HttpResponse> {
    let buffer = serde_json::to_vec(value)?;
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, buffer.len())
        .body(bytes_body(buffer))?)
}

#[derive(Serialize)]
struct ErrorMessage<'a> {
    error: &'a str,
}

pub(crate) fn json_error(status: StatusCode, msg: &str) -> Result<HttpResponse> {
    json(status, &ErrorMessage { error: msg })
}

/// A response the browser saves instead of displaying
pub(crate) fn download(content_type: &str, filename: &str, content: Vec<u8>) -> Result<HttpResponse> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, content.len())
        .header(header::CONTENT_DISPOSITION, content_disposition(filename))
        .body(bytes_body(content))?)
}

/// RFC6266: a plain ASCII `filename` for old clients,
/// the exact name in `filename*` for the others.
fn content_disposition(filename: &str) -> String {
    let fallback = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect::<String>();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(filename, NON_ALPHANUMERIC)
    )
}
