pub mod config;
pub mod error;
pub mod memory;
pub mod notmuch;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

pub use error::{Error, Result};

// The index is split in 2 layers:
// - A provider, long lived, that knows how to reach the index
// - A database handle, short lived, opened once per HTTP request

pub type ArcIndexProvider = Arc<dyn IndexProvider + Send + Sync>;
pub type ArcDatabase = Arc<dyn Database + Send + Sync>;

#[async_trait]
pub trait IndexProvider {
    /// Open a handle on the index, fails with `Error::Unavailable`
    /// when the index can't be reached.
    async fn open(&self) -> Result<ArcDatabase>;
}

#[async_trait]
pub trait Database {
    /// Threads matching a free-text index query, newest first.
    async fn search_threads(&self, query: &str, page: Page) -> Result<Vec<Thread>>;

    /// All the messages of a thread, oldest first.
    async fn thread_messages(&self, thread_id: &str) -> Result<Vec<Message>>;

    async fn find_message(&self, message_id: &str) -> Result<Message>;

    /// Raw RFC5322 content of a message
    async fn message_source(&self, message: &Message) -> Result<Vec<u8>>;
}

/// A thread as summarized by the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub thread_id: String,
    /// Matched authors first, then a `|`, then the others
    pub authors: String,
    pub subject: String,
    pub newest_date: i64,
    pub oldest_date: i64,
    pub matched_messages: u32,
    pub total_messages: u32,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_id: String,
    pub thread_id: String,
    pub filename: PathBuf,
    pub timestamp: i64,
    pub tags: Vec<String>,
}

/// A slice of a result set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Page {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.offset);
        match self.limit {
            Some(n) => skipped.take(n).collect(),
            None => skipped.collect(),
        }
    }
}

/// Quote a value so it can be used as a single term of an index query.
/// Bare values are kept as is, others are enclosed in double quotes
/// with inner quotes doubled.
pub fn quote_term(value: &str) -> String {
    let bare = !value.is_empty()
        && value
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '"' | '(' | ')'));
    if bare {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_slices() {
        let all = Page::all().apply(0..5);
        assert_eq!(all, vec![0, 1, 2, 3, 4]);

        let page = Page {
            offset: 1,
            limit: Some(2),
        };
        assert_eq!(page.apply(0..5), vec![1, 2]);

        let past_end = Page {
            offset: 10,
            limit: None,
        };
        assert!(past_end.apply(0..5).is_empty());
    }

    #[test]
    fn quoting() {
        assert_eq!(quote_term("0000000000000a2f"), "0000000000000a2f");
        assert_eq!(
            quote_term("20230708.abc@example.tld"),
            "20230708.abc@example.tld"
        );
        assert_eq!(quote_term("has space"), "\"has space\"");
        assert_eq!(quote_term("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_term(""), "\"\"");
    }
}
