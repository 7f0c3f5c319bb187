//! A small mailbox served with `--dev`, no notmuch needed.

use anyhow::{Context, Result};

use viel_index::memory::{MemoryIndex, MemoryMessage};
use viel_mail::Envelope;

static WELCOME: &[u8] = b"Date: Sat, 8 Jul 2023 07:14:29 +0200\r
From: Bob Robert <bob@example.tld>\r
To: Alice Malice <alice@example.tld>\r
CC: =?ISO-8859-1?Q?Andr=E9?= Pirard <andre@example.tld>\r
Subject: Welcome to netviel\r
Message-ID: <welcome@example.tld>\r
MIME-Version: 1.0\r
Content-Type: multipart/mixed; boundary=\"outer\"\r
\r
--outer\r
Content-Type: multipart/alternative; boundary=\"inner\"\r
\r
--inner\r
Content-Type: text/plain; charset=utf-8\r
Content-Transfer-Encoding: quoted-printable\r
\r
Hello Alice,=0D=0Athis mailbox is served from memory.\r
--inner\r
Content-Type: text/html; charset=utf-8\r
\r
<p>Hello Alice,</p><p>this mailbox is <b>served from memory</b>.</p><script>alert(1)</script>\r
--inner--\r
--outer\r
Content-Type: text/plain; charset=utf-8; name=\"notes.txt\"\r
Content-Disposition: attachment; filename=\"notes.txt\"\r
\r
Some notes.\r
--outer--\r
";

static WELCOME_REPLY: &[u8] = b"Date: Sat, 8 Jul 2023 10:02:11 +0200\r
From: Alice Malice <alice@example.tld>\r
To: Bob Robert <bob@example.tld>\r
Subject: Re: Welcome to netviel\r
Message-ID: <welcome-reply@example.tld>\r
In-Reply-To: <welcome@example.tld>\r
References: <welcome@example.tld>\r
Content-Type: text/plain; charset=utf-8\r
\r
Thanks Bob!\r
";

static NEWSLETTER: &[u8] = b"Date: Mon, 10 Jul 2023 18:30:00 +0000\r
From: Newsletter <news@example.tld>\r
To: alice@example.tld\r
Subject: =?UTF-8?Q?Caf=C3=A9_weekly?=\r
Message-ID: <news-42@example.tld>\r
Content-Type: text/plain; charset=utf-8\r
\r
Nothing new this week.\r
";

fn message(thread_id: &str, tags: &[&str], raw: &'static [u8]) -> Result<MemoryMessage> {
    let envelope = Envelope::parse(raw)?;
    Ok(MemoryMessage {
        message_id: envelope
            .message_id
            .clone()
            .context("demo message without Message-ID")?,
        thread_id: thread_id.to_string(),
        timestamp: envelope.timestamp().unwrap_or_default(),
        author: envelope.author().unwrap_or_default(),
        subject: envelope.subject.clone().unwrap_or_default(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        raw: raw.to_vec(),
    })
}

pub fn demo_index() -> Result<MemoryIndex> {
    Ok(MemoryIndex::new(vec![
        message("0000000000000001", &["attachment", "inbox"], WELCOME)?,
        message("0000000000000001", &["inbox", "unread"], WELCOME_REPLY)?,
        message("0000000000000002", &["inbox", "newsletter"], NEWSLETTER)?,
    ]))
}
