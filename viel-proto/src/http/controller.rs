use anyhow::{anyhow, Result};
use hyper::header;
use hyper::{Method, Response, StatusCode, Uri};
use percent_encoding::percent_decode_str;

use viel_index::{Message, Page, Thread};
use viel_mail::{MessageView, MimeView, ThreadView};

use crate::http::codec::{self, empty_body, HttpResponse};
use crate::http::context::RequestContext;
use crate::http::State;

/// Routes of the REST API, anything else is a frontend asset.
///
/// ```raw
/// GET /api/query/<query>?offset=<n>&limit=<n>   threads matching a notmuch query
/// GET /api/thread/<thread_id>                   messages of a thread, oldest first
/// GET /api/attachment/<message_id>/<num>        download an attachment
/// GET /api/message/<message_id>                 download the raw message
/// ```
pub(crate) struct Controller<'a> {
    state: &'a State,
    ctx: RequestContext,
}

impl<'a> Controller<'a> {
    pub(crate) async fn route(state: &'a State, method: &Method, uri: &Uri) -> Result<HttpResponse> {
        let head = match *method {
            Method::GET => false,
            Method::HEAD => true,
            _ => {
                return Ok(Response::builder()
                    .status(StatusCode::METHOD_NOT_ALLOWED)
                    .header(header::ALLOW, "GET, HEAD, OPTIONS")
                    .body(codec::text_body("HTTP Method not allowed"))?)
            }
        };

        let ctrl = Self {
            state,
            ctx: RequestContext::new(state.index.clone()),
        };

        let path = uri.path();
        let segments = match path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8().map(|v| v.into_owned()))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(v) => v,
            Err(e) => {
                tracing::info!(err=%e, %path, "path is not valid UTF-8");
                return codec::json_error(StatusCode::NOT_FOUND, "Not found");
            }
        };
        let segments = segments.iter().map(String::as_str).collect::<Vec<_>>();

        let response = match segments.as_slice() {
            ["api", "query", query] => ctrl.query(query, uri.query()).await,
            ["api", "thread", thread_id] => ctrl.thread(thread_id).await,
            ["api", "attachment", message_id, num] => match num.parse::<usize>() {
                Ok(num) => ctrl.attachment(message_id, num).await,
                Err(_) => codec::json_error(StatusCode::NOT_FOUND, "Not found"),
            },
            ["api", "message", message_id] => ctrl.message(message_id).await,
            ["api", ..] => codec::json_error(StatusCode::NOT_FOUND, "Not found"),
            _ => ctrl.state.assets.serve(path).await,
        };

        // API clients always get a JSON body, even on internal failures
        let response = match response {
            Ok(r) => r,
            Err(e) if segments.first() == Some(&"api") => {
                tracing::error!(err=?e, %path, "API request failed");
                codec::json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())?
            }
            Err(e) => return Err(e),
        };

        if head {
            let (parts, _) = response.into_parts();
            return Ok(Response::from_parts(parts, empty_body()));
        }
        Ok(response)
    }

    // --- Per-route functions ---

    async fn query(&self, query: &str, params: Option<&str>) -> Result<HttpResponse> {
        let page = match parse_page(params) {
            Ok(p) => p,
            Err(e) => return codec::json_error(StatusCode::BAD_REQUEST, &e.to_string()),
        };

        let threads = match self.search(query, page).await {
            Ok(v) => v,
            Err(e) => return index_failure(e),
        };
        tracing::debug!(%query, found = threads.len(), "threads matched");

        codec::json(StatusCode::OK, &ThreadView::from_threads(&threads))
    }

    async fn thread(&self, thread_id: &str) -> Result<HttpResponse> {
        let loaded = match self.load_thread(thread_id).await {
            Ok(v) => v,
            Err(e) => return index_failure(e),
        };

        let views = loaded
            .iter()
            .map(|(msg, raw)| MessageView::build(msg, raw))
            .collect::<Result<Vec<_>>>()?;
        codec::json(StatusCode::OK, &views)
    }

    async fn attachment(&self, message_id: &str, num: usize) -> Result<HttpResponse> {
        let (_, raw) = match self.load_message(message_id).await {
            Ok(v) => v,
            Err(e) => return index_failure(e),
        };

        let attachment = match MimeView::parse(&raw)?.attachment(num)? {
            Some(a) => a,
            None => {
                tracing::info!(%message_id, num, "no such attachment");
                return codec::json_error(
                    StatusCode::NOT_FOUND,
                    &format!("message {} has no attachment {}", message_id, num),
                );
            }
        };

        let filename = attachment
            .filename
            .unwrap_or_else(|| format!("attachment-{}", num));
        // text is transcoded to UTF-8 whatever its original charset
        let content_type = if attachment.content_type.starts_with("text/") {
            format!("{}; charset=utf-8", attachment.content_type)
        } else {
            attachment.content_type
        };
        codec::download(&content_type, &filename, attachment.content)
    }

    async fn message(&self, message_id: &str) -> Result<HttpResponse> {
        let (_, raw) = match self.load_message(message_id).await {
            Ok(v) => v,
            Err(e) => return index_failure(e),
        };
        codec::download("message/rfc822", &format!("{}.eml", message_id), raw)
    }

    // --- Index access ---

    async fn search(&self, query: &str, page: Page) -> viel_index::Result<Vec<Thread>> {
        self.ctx.db().await?.search_threads(query, page).await
    }

    async fn load_thread(&self, thread_id: &str) -> viel_index::Result<Vec<(Message, Vec<u8>)>> {
        let db = self.ctx.db().await?;
        let mut loaded = vec![];
        for msg in db.thread_messages(thread_id).await? {
            let raw = db.message_source(&msg).await?;
            loaded.push((msg, raw));
        }
        Ok(loaded)
    }

    async fn load_message(&self, message_id: &str) -> viel_index::Result<(Message, Vec<u8>)> {
        let db = self.ctx.db().await?;
        let msg = db.find_message(message_id).await?;
        let raw = db.message_source(&msg).await?;
        Ok((msg, raw))
    }
}

fn index_failure(err: viel_index::Error) -> Result<HttpResponse> {
    let status = match &err {
        viel_index::Error::NotFound(_) => {
            tracing::info!(%err, "index lookup failed");
            StatusCode::NOT_FOUND
        }
        viel_index::Error::Unavailable(_) => {
            tracing::error!(%err, "index unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => {
            tracing::error!(%err, "index error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    codec::json_error(status, &err.to_string())
}

/// `offset` and `limit` from an URI query string, unknown keys are ignored
fn parse_page(params: Option<&str>) -> Result<Page> {
    let mut page = Page::all();
    let params = match params {
        Some(p) => p,
        None => return Ok(page),
    };

    for pair in params.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = percent_decode_str(value).decode_utf8_lossy();
        match key {
            "offset" => {
                page.offset = value
                    .parse()
                    .map_err(|_| anyhow!("offset must be a non-negative integer"))?
            }
            "limit" => {
                page.limit = Some(
                    value
                        .parse()
                        .map_err(|_| anyhow!("limit must be a non-negative integer"))?,
                )
            }
            _ => (),
        }
    }
    Ok(page)
}
