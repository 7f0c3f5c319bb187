use anyhow::{Context, Result};
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use serde::Serialize;

/// Content types we can render, by order of preference
const BODY_PREFERENCE: [&str; 2] = ["text/html", "text/plain"];

/// The part of a message a reader wants to see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub content_type: String,
    pub content: String,
}

/// What is listed about an attachment next to a message
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AttachmentInfo {
    pub filename: Option<String>,
    pub content_type: String,
}

/// A downloadable attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: Option<String>,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Read-only view over a parsed MIME message.
///
/// Attachments are numbered by a depth-first walk over the
/// non-multipart parts declaring a `Content-Disposition` of
/// `attachment` or `inline`. The same numbering is used to list
/// them and to fetch them, so a number handed out in a listing
/// points to the same part when downloaded.
///
/// ```raw
///    multipart/mixed
///      multipart/alternative
///        text/plain                              (body candidate)
///        text/html                               (body candidate, preferred)
///      application/pdf    attachment             #0
///      image/png          inline                 #1
///      text/plain         attachment             #2
/// ```
pub struct MimeView<'a> {
    root: ParsedMail<'a>,
}

impl<'a> MimeView<'a> {
    pub fn parse(raw: &'a [u8]) -> Result<Self> {
        let root = mailparse::parse_mail(raw).context("unable to parse MIME message")?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &ParsedMail<'a> {
        &self.root
    }

    /// The preferred textual body: HTML, else plain text.
    /// Parts declared as attachments never qualify.
    pub fn body(&self) -> Result<Option<Body>> {
        let mut candidates = vec![];
        find_body(&self.root, &mut candidates);

        // first occurrence of the best ranked type wins
        let best = candidates.into_iter().min_by_key(|(rank, _)| *rank);
        match best {
            None => Ok(None),
            Some((_, part)) => Ok(Some(Body {
                content_type: mimetype(part),
                content: part.get_body().context("unable to decode message body")?,
            })),
        }
    }

    pub fn attachments(&self) -> Vec<AttachmentInfo> {
        self.listed_parts()
            .into_iter()
            .map(|part| AttachmentInfo {
                filename: filename(part),
                content_type: mimetype(part),
            })
            .collect()
    }

    /// Fetch the `num`-th attachment of the listing, with its decoded content.
    /// Text is re-encoded as UTF-8, anything else is returned as transferred.
    pub fn attachment(&self, num: usize) -> Result<Option<Attachment>> {
        let part = match self.listed_parts().into_iter().nth(num) {
            Some(p) => p,
            None => return Ok(None),
        };

        let content_type = mimetype(part);
        let content = if content_type.starts_with("text/") {
            part.get_body()
                .context("unable to decode text attachment")?
                .into_bytes()
        } else {
            part.get_body_raw()
                .context("unable to decode binary attachment")?
        };

        Ok(Some(Attachment {
            filename: filename(part),
            content_type,
            content,
        }))
    }

    fn listed_parts(&self) -> Vec<&ParsedMail<'a>> {
        let mut leaves = vec![];
        walk_leaves(&self.root, &mut leaves);
        leaves
            .into_iter()
            .filter(|part| {
                matches!(
                    disposition(part),
                    Some(DispositionType::Attachment) | Some(DispositionType::Inline)
                )
            })
            .collect()
    }
}

//----------------------------------------------------------

fn mimetype(part: &ParsedMail) -> String {
    part.ctype.mimetype.to_ascii_lowercase()
}

fn is_multipart(part: &ParsedMail) -> bool {
    mimetype(part).starts_with("multipart/")
}

/// mailparse defaults to `inline` when the header is missing,
/// we need to tell both cases apart.
fn disposition(part: &ParsedMail) -> Option<DispositionType> {
    part.headers.get_first_value("Content-Disposition")?;
    Some(part.get_content_disposition().disposition)
}

fn is_attachment(part: &ParsedMail) -> bool {
    disposition(part) == Some(DispositionType::Attachment)
}

fn walk_leaves<'p, 'a>(part: &'p ParsedMail<'a>, out: &mut Vec<&'p ParsedMail<'a>>) {
    if !is_multipart(part) {
        out.push(part);
    }
    for sub in part.subparts.iter() {
        walk_leaves(sub, out);
    }
}

/// Collect the body candidates with their rank in `BODY_PREFERENCE`.
/// A multipart/related is represented by its root only: the part named by
/// its `start` parameter, else its first child.
fn find_body<'p, 'a>(part: &'p ParsedMail<'a>, out: &mut Vec<(usize, &'p ParsedMail<'a>)>) {
    if is_attachment(part) {
        return;
    }

    let ctype = mimetype(part);
    if ctype.starts_with("text/") {
        if let Some(rank) = BODY_PREFERENCE.iter().position(|p| *p == ctype) {
            out.push((rank, part));
        }
        return;
    }

    if !ctype.starts_with("multipart/") {
        return;
    }

    if ctype != "multipart/related" {
        for sub in part.subparts.iter() {
            find_body(sub, out);
        }
        return;
    }

    let start = part.ctype.params.get("start");
    let root = start
        .and_then(|cid| {
            part.subparts
                .iter()
                .find(|sub| sub.headers.get_first_value("Content-ID").as_ref() == Some(cid))
        })
        .or_else(|| part.subparts.first());
    if let Some(root) = root {
        find_body(root, out);
    }
}

/// Attachment name, from the disposition first, then from the content type.
/// Encoded words are decoded.
fn filename(part: &ParsedMail) -> Option<String> {
    let disposition = part.get_content_disposition();
    disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .map(|v| decode_words(v).trim().to_string())
}

fn decode_words(value: &str) -> String {
    if !value.contains("=?") {
        return value.to_string();
    }
    let synthetic = format!("X: {}", value);
    match mailparse::parse_header(synthetic.as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(e) => {
            tracing::debug!(err=?e, "unable to decode encoded words");
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn html_is_preferred() {
        let view = MimeView::parse(MULTIPART).unwrap();
        let body = view.body().unwrap().unwrap();
        assert_eq!(body.content_type, "text/html");
        assert!(body.content.contains("<strong>GZ</strong>"));
    }

    #[test]
    fn plain_text_fallback() {
        let view = MimeView::parse(PLAIN).unwrap();
        let body = view.body().unwrap().unwrap();
        assert_eq!(body.content_type, "text/plain");
        assert_eq!(body.content.trim_end(), "Hello world!");
        assert!(view.attachments().is_empty());
    }

    #[test]
    fn attachments_are_not_bodies() {
        let view = MimeView::parse(NO_BODY).unwrap();
        assert!(view.body().unwrap().is_none());

        let listed = view.attachments();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename.as_deref(), Some("scan.txt"));
    }

    #[test]
    fn related_root_is_followed() {
        let view = MimeView::parse(RELATED).unwrap();
        let body = view.body().unwrap().unwrap();
        assert_eq!(body.content_type, "text/plain");
        assert_eq!(body.content.trim_end(), "the root");
    }

    #[test]
    fn listing() {
        let view = MimeView::parse(MULTIPART).unwrap();
        let listed = view.attachments();
        assert_eq!(
            listed,
            vec![
                AttachmentInfo {
                    filename: Some("report.pdf".into()),
                    content_type: "application/pdf".into(),
                },
                AttachmentInfo {
                    filename: None,
                    content_type: "image/png".into(),
                },
                AttachmentInfo {
                    filename: Some("notes à lire.txt".into()),
                    content_type: "text/plain".into(),
                },
            ]
        );
    }

    #[test]
    fn fetch_by_number() {
        let view = MimeView::parse(MULTIPART).unwrap();

        let pdf = view.attachment(0).unwrap().unwrap();
        assert_eq!(pdf.content_type, "application/pdf");
        assert_eq!(pdf.content, b"%PDF-1.4\n");

        let png = view.attachment(1).unwrap().unwrap();
        assert!(png.content.starts_with(b"\x89PNG"));

        let txt = view.attachment(2).unwrap().unwrap();
        assert_eq!(String::from_utf8(txt.content).unwrap().trim_end(), "remember the milk");

        assert!(view.attachment(3).unwrap().is_none());
    }

    #[test]
    fn legacy_charset_is_transcoded() {
        let view = MimeView::parse(LATIN1).unwrap();
        let menu = view.attachment(0).unwrap().unwrap();
        assert_eq!(menu.content_type, "text/plain");
        assert_eq!(menu.filename.as_deref(), Some("menu.txt"));
        assert_eq!(String::from_utf8(menu.content).unwrap().trim_end(), "café");
    }

    #[test]
    fn undecodable_body_is_an_error() {
        let view = MimeView::parse(BROKEN_BASE64).unwrap();
        assert!(view.body().is_err());
    }
}
