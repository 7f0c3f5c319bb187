use anyhow::{Context, Result};
use mailparse::{MailAddr, MailHeader, MailHeaderMap};

/// The RFC5322 headers shown next to a message.
/// Values are decoded (RFC2047), absent headers are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub date: Option<String>,
    pub subject: Option<String>,
    pub message_id: Option<String>,
}

impl Envelope {
    /// Only the header section of `raw` is read
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (headers, _) =
            mailparse::parse_headers(raw).context("unable to parse message headers")?;
        Ok(Self::from_headers(&headers))
    }

    pub fn from_headers(headers: &[MailHeader]) -> Self {
        Self {
            from: headers.get_first_value("From"),
            to: headers.get_first_value("To"),
            cc: headers.get_first_value("Cc"),
            bcc: headers.get_first_value("Bcc"),
            date: headers.get_first_value("Date"),
            subject: headers.get_first_value("Subject"),
            message_id: headers
                .get_first_value("Message-ID")
                .map(|v| v.trim().trim_start_matches('<').trim_end_matches('>').to_string()),
        }
    }

    /// Date header as a unix timestamp
    pub fn timestamp(&self) -> Option<i64> {
        self.date
            .as_deref()
            .and_then(|d| mailparse::dateparse(d).ok())
    }

    /// Display name of the first sender, else its address
    pub fn author(&self) -> Option<String> {
        let from = self.from.as_deref()?;
        let first = match mailparse::addrparse(from) {
            Ok(list) => list.iter().next().cloned(),
            Err(_) => return Some(from.trim().to_string()),
        };
        match first? {
            MailAddr::Single(info) => Some(info.display_name.unwrap_or(info.addr)),
            MailAddr::Group(group) => Some(group.group_name),
        }
    }
}
