pub static MULTIPART: &[u8] = b"Date: Sat, 8 Jul 2023 07:14:29 +0200\r
From: Bob Robert <bob@example.tld>\r
To: Alice Malice <alice@example.tld>\r
CC: =?ISO-8859-1?Q?Andr=E9?= Pirard <PIRARD@vm1.ulg.ac.be>\r
Subject: =?ISO-8859-1?B?SWYgeW91IGNhbiByZWFkIHRoaXMgeW8=?=\r
    =?ISO-8859-2?B?dSB1bmRlcnN0YW5kIHRoZSBleGFtcGxlLg==?=\r
Message-ID: <NTAxNzA2AC47634Y366BAMTY4ODc5MzQyODY0ODY5@www.grrrndzero.org>\r
MIME-Version: 1.0\r
Content-Type: multipart/mixed; boundary=\"outer\"\r
\r
This is a multi-part message in MIME format.\r
\r
--outer\r
Content-Type: multipart/alternative; boundary=\"inner\"\r
\r
--inner\r
Content-Type: text/plain; charset=utf-8\r
Content-Transfer-Encoding: quoted-printable\r
\r
GZ caf=C3=A9\r
--inner\r
Content-Type: text/html; charset=us-ascii\r
\r
<div style=\"text-align: center;\"><strong>GZ</strong><script>alert(1)</script><img src=\"https://tracker.example/p.gif\"><a href=\"https://example.tld\" onclick=\"x()\">link</a></div>\r
--inner--\r
\r
--outer\r
Content-Type: application/pdf; name=\"report.pdf\"\r
Content-Disposition: attachment; filename=\"report.pdf\"\r
Content-Transfer-Encoding: base64\r
\r
JVBERi0xLjQK\r
--outer\r
Content-Type: image/png\r
Content-Disposition: inline\r
Content-ID: <logo@example.tld>\r
Content-Transfer-Encoding: base64\r
\r
iVBORw0KGgo=\r
--outer\r
Content-Type: text/plain; charset=utf-8; name=\"=?UTF-8?Q?notes_=C3=A0_lire.txt?=\"\r
Content-Disposition: attachment\r
\r
remember the milk\r
--outer--\r
";

pub static PLAIN: &[u8] = b"From: alice@example.com\r
To: alice@example.tld\r
Subject: Test\r
Date: Sun, 9 Jul 2023 10:00:00 +0000\r
Message-ID: <plain@example.com>\r
\r
Hello world!\r
";

/// The only text part is an attachment, there is no body to show
pub static NO_BODY: &[u8] = b"From: carol@example.tld\r
Subject: scan\r
MIME-Version: 1.0\r
Content-Type: multipart/mixed; boundary=\"b\"\r
\r
--b\r
Content-Type: text/plain\r
Content-Disposition: attachment; filename=\"scan.txt\"\r
\r
scanned\r
--b--\r
";

/// multipart/related pointing at its root through `start`
pub static RELATED: &[u8] = b"From: dave@example.tld\r
Subject: newsletter\r
MIME-Version: 1.0\r
Content-Type: multipart/related; boundary=\"r\"; start=\"<root@example.tld>\"\r
\r
--r\r
Content-Type: text/html\r
\r
<p>not the root</p>\r
--r\r
Content-Type: text/plain\r
Content-ID: <root@example.tld>\r
\r
the root\r
--r--\r
";

/// Body declared as base64 but not decodable
pub static BROKEN_BASE64: &[u8] = b"From: eve@example.tld\r
Subject: garbled\r
MIME-Version: 1.0\r
Content-Type: text/html; charset=utf-8\r
Content-Transfer-Encoding: base64\r
\r
!!!not base64!!!\r
";

/// A text attachment in a legacy charset
pub static LATIN1: &[u8] = b"From: frank@example.tld\r
Subject: menu\r
MIME-Version: 1.0\r
Content-Type: multipart/mixed; boundary=\"l\"\r
\r
--l\r
Content-Type: text/plain; charset=us-ascii\r
\r
see attached\r
--l\r
Content-Type: text/plain; charset=iso-8859-1; name=\"menu.txt\"\r
Content-Disposition: attachment; filename=\"menu.txt\"\r
Content-Transfer-Encoding: quoted-printable\r
\r
caf=E9\r
--l--\r
";
