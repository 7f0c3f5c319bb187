//! JSON shapes handed to the web frontend

use anyhow::Result;
use serde::Serialize;

use viel_index::{Message, Thread};

use crate::imf_view::Envelope;
use crate::mime_view::{AttachmentInfo, MimeView};
use crate::sanitize::sanitize_html;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ThreadView {
    pub authors: String,
    pub matched_messages: u32,
    pub newest_date: i64,
    pub oldest_date: i64,
    pub subject: String,
    pub tags: Vec<String>,
    pub thread_id: String,
    pub total_messages: u32,
}

impl From<&Thread> for ThreadView {
    fn from(t: &Thread) -> Self {
        Self {
            authors: t.authors.clone(),
            matched_messages: t.matched_messages,
            newest_date: t.newest_date,
            oldest_date: t.oldest_date,
            subject: t.subject.clone(),
            tags: t.tags.clone(),
            thread_id: t.thread_id.clone(),
            total_messages: t.total_messages,
        }
    }
}

impl ThreadView {
    pub fn from_threads(threads: &[Thread]) -> Vec<Self> {
        threads.iter().map(Self::from).collect()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub date: Option<String>,
    pub subject: Option<String>,
    pub content: String,
    pub content_type: String,
    pub attachments: Vec<AttachmentInfo>,
    pub message_id: String,
    pub tags: Vec<String>,
    pub timestamp: i64,
}

impl MessageView {
    /// `raw` is the content of the file the index points to for `message`.
    /// HTML bodies are sanitized, a message without a textual body,
    /// or with one that can't be decoded, is shown as empty plain text.
    pub fn build(message: &Message, raw: &[u8]) -> Result<Self> {
        let mime = MimeView::parse(raw)?;
        let envelope = Envelope::from_headers(&mime.root().headers);

        let body = match mime.body() {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(err=?e, message_id=%message.message_id, "body not decodable, shown empty");
                None
            }
        };
        let (content_type, content) = match body {
            Some(body) if body.content_type == "text/html" => {
                let clean = sanitize_html(&body.content);
                (body.content_type, clean)
            }
            Some(body) => (body.content_type, body.content),
            None => ("text/plain".to_string(), String::new()),
        };

        Ok(Self {
            from: envelope.from,
            to: envelope.to,
            cc: envelope.cc,
            bcc: envelope.bcc,
            date: envelope.date,
            subject: envelope.subject,
            content,
            content_type,
            attachments: mime.attachments(),
            message_id: message.message_id.clone(),
            tags: message.tags.clone(),
            timestamp: message.timestamp,
        })
    }
}
