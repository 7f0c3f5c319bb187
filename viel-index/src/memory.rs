//! An index held in memory, for tests and the developer mode.
//!
//! Queries are not parsed: `*`, `tag:`, `thread:`, `id:` and `mid:` are
//! recognized as a whole, anything else is a case-insensitive substring
//! match on the subject and the author.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{ArcDatabase, Database, Error, IndexProvider, Message, Page, Result, Thread};

#[derive(Debug, Clone)]
pub struct MemoryMessage {
    pub message_id: String,
    pub thread_id: String,
    pub timestamp: i64,
    pub author: String,
    pub subject: String,
    pub tags: Vec<String>,
    pub raw: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    messages: Arc<Vec<MemoryMessage>>,
}

impl MemoryIndex {
    pub fn new(messages: Vec<MemoryMessage>) -> Self {
        Self {
            messages: Arc::new(messages),
        }
    }

    fn get(&self, message_id: &str) -> Option<&MemoryMessage> {
        self.messages.iter().find(|m| m.message_id == message_id)
    }

    fn thread(&self, thread_id: &str, term: &Term) -> Option<Thread> {
        let mut msgs = self
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .collect::<Vec<_>>();
        msgs.sort_by_key(|m| m.timestamp);

        // dates and subject come from the matched messages only,
        // the subject from the newest one as in a newest-first search
        let (matched, others): (Vec<&MemoryMessage>, Vec<&MemoryMessage>) =
            msgs.iter().copied().partition(|m| term.matches(m));
        let first = matched.first()?;
        let last = matched.last()?;

        let mut authors = unique_authors(&matched).join(", ");
        let other_authors = unique_authors(&others)
            .into_iter()
            .filter(|a| !matched.iter().any(|m| &m.author == a))
            .collect::<Vec<_>>();
        if !other_authors.is_empty() {
            authors.push_str("| ");
            authors.push_str(&other_authors.join(", "));
        }

        let tags = msgs
            .iter()
            .flat_map(|m| m.tags.iter().cloned())
            .collect::<BTreeSet<_>>();

        Some(Thread {
            thread_id: thread_id.to_string(),
            authors,
            subject: last.subject.clone(),
            newest_date: last.timestamp,
            oldest_date: first.timestamp,
            matched_messages: matched.len() as u32,
            total_messages: msgs.len() as u32,
            tags: tags.into_iter().collect(),
        })
    }
}

fn unique_authors(msgs: &[&MemoryMessage]) -> Vec<String> {
    let mut out: Vec<String> = vec![];
    for m in msgs {
        if !out.contains(&m.author) {
            out.push(m.author.clone());
        }
    }
    out
}

impl MemoryMessage {
    fn to_message(&self) -> Message {
        Message {
            message_id: self.message_id.clone(),
            thread_id: self.thread_id.clone(),
            filename: PathBuf::from("memory").join(&self.message_id),
            timestamp: self.timestamp,
            tags: self.tags.clone(),
        }
    }
}

#[async_trait]
impl IndexProvider for MemoryIndex {
    async fn open(&self) -> Result<ArcDatabase> {
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl Database for MemoryIndex {
    async fn search_threads(&self, query: &str, page: Page) -> Result<Vec<Thread>> {
        let term = Term::parse(query);

        let mut thread_ids: Vec<&str> = vec![];
        for m in self.messages.iter().filter(|m| term.matches(m)) {
            if !thread_ids.contains(&m.thread_id.as_str()) {
                thread_ids.push(&m.thread_id);
            }
        }

        let mut threads = thread_ids
            .into_iter()
            .filter_map(|id| self.thread(id, &term))
            .collect::<Vec<_>>();
        threads.sort_by(|a, b| b.newest_date.cmp(&a.newest_date));
        Ok(page.apply(threads))
    }

    async fn thread_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let mut msgs = self
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .collect::<Vec<_>>();
        if msgs.is_empty() {
            return Err(Error::NotFound(format!("thread {}", thread_id)));
        }
        msgs.sort_by_key(|m| m.timestamp);
        Ok(msgs.into_iter().map(MemoryMessage::to_message).collect())
    }

    async fn find_message(&self, message_id: &str) -> Result<Message> {
        self.get(message_id)
            .map(MemoryMessage::to_message)
            .ok_or_else(|| Error::NotFound(format!("message {}", message_id)))
    }

    async fn message_source(&self, message: &Message) -> Result<Vec<u8>> {
        self.get(&message.message_id)
            .map(|m| m.raw.clone())
            .ok_or_else(|| Error::NotFound(format!("message {}", message.message_id)))
    }
}

/// An index that can never be opened
#[derive(Debug, Clone, Default)]
pub struct OfflineIndex;

#[async_trait]
impl IndexProvider for OfflineIndex {
    async fn open(&self) -> Result<ArcDatabase> {
        Err(Error::Unavailable("index is offline".into()))
    }
}

enum Term {
    All,
    Tag(String),
    Thread(String),
    Id(String),
    Text(String),
}

impl Term {
    fn parse(query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() || query == "*" {
            return Self::All;
        }
        if let Some(v) = query.strip_prefix("tag:") {
            return Self::Tag(unquote(v));
        }
        if let Some(v) = query.strip_prefix("thread:") {
            return Self::Thread(unquote(v));
        }
        if let Some(v) = query
            .strip_prefix("id:")
            .or_else(|| query.strip_prefix("mid:"))
        {
            return Self::Id(unquote(v));
        }
        Self::Text(query.to_lowercase())
    }

    fn matches(&self, m: &MemoryMessage) -> bool {
        match self {
            Self::All => true,
            Self::Tag(t) => m.tags.iter().any(|x| x == t),
            Self::Thread(t) => &m.thread_id == t,
            Self::Id(id) => &m.message_id == id,
            Self::Text(txt) => {
                m.subject.to_lowercase().contains(txt) || m.author.to_lowercase().contains(txt)
            }
        }
    }
}

fn unquote(value: &str) -> String {
    match value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str, thread: &str, ts: i64, author: &str, tags: &[&str]) -> MemoryMessage {
        MemoryMessage {
            message_id: id.into(),
            thread_id: thread.into(),
            timestamp: ts,
            author: author.into(),
            subject: format!("subject of {}", id),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            raw: format!("Message-ID: <{}>\r\n\r\nbody\r\n", id).into_bytes(),
        }
    }

    fn index() -> MemoryIndex {
        MemoryIndex::new(vec![
            msg("a@x", "t1", 100, "Alice", &["inbox"]),
            msg("b@x", "t1", 300, "Bob", &["inbox", "unread"]),
            msg("c@x", "t2", 200, "Carol", &["sent"]),
        ])
    }

    #[tokio::test]
    async fn threads_newest_first() {
        let threads = index().search_threads("*", Page::all()).await.unwrap();
        let ids = threads.iter().map(|t| t.thread_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["t1", "t2"]);

        let t1 = &threads[0];
        assert_eq!(t1.newest_date, 300);
        assert_eq!(t1.oldest_date, 100);
        assert_eq!(t1.total_messages, 2);
        assert_eq!(t1.matched_messages, 2);
        assert_eq!(t1.authors, "Alice, Bob");
        assert_eq!(t1.subject, "subject of b@x");
        assert_eq!(t1.tags, vec!["inbox", "unread"]);
    }

    #[tokio::test]
    async fn partial_match_splits_authors() {
        let threads = index()
            .search_threads("tag:unread", Page::all())
            .await
            .unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].matched_messages, 1);
        assert_eq!(threads[0].total_messages, 2);
        assert_eq!(threads[0].authors, "Bob| Alice");
    }

    #[tokio::test]
    async fn dates_and_subject_follow_the_match() {
        let threads = index()
            .search_threads("alice", Page::all())
            .await
            .unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].oldest_date, 100);
        assert_eq!(threads[0].newest_date, 100);
        assert_eq!(threads[0].subject, "subject of a@x");
        assert_eq!(threads[0].total_messages, 2);
    }

    #[tokio::test]
    async fn paging() {
        let page = Page {
            offset: 1,
            limit: Some(5),
        };
        let threads = index().search_threads("*", page).await.unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].thread_id, "t2");
    }

    #[tokio::test]
    async fn lookups() {
        let idx = index();
        let msgs = idx.thread_messages("t1").await.unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].message_id, "a@x");

        assert!(idx.thread_messages("nope").await.unwrap_err().is_not_found());
        assert!(idx.find_message("nope").await.unwrap_err().is_not_found());

        let c = idx.find_message("c@x").await.unwrap();
        let raw = idx.message_source(&c).await.unwrap();
        assert!(raw.starts_with(b"Message-ID: <c@x>"));
    }

    #[tokio::test]
    async fn text_and_quoted_terms() {
        let idx = index();
        let carol = idx.search_threads("carol", Page::all()).await.unwrap();
        assert_eq!(carol.len(), 1);

        let quoted = idx.search_threads("id:\"b@x\"", Page::all()).await.unwrap();
        assert_eq!(quoted[0].thread_id, "t1");
    }

    #[tokio::test]
    async fn offline_index() {
        assert!(OfflineIndex.open().await.err().unwrap().is_unavailable());
    }
}
