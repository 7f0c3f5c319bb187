//! Index backend driving the `notmuch` command line client.
//!
//! Every call spawns `notmuch` with a JSON output format and decodes its
//! standard output. The database location and the notmuch configuration
//! file are passed through the environment (`NOTMUCH_DATABASE`,
//! `NOTMUCH_CONFIG`), so the user's own notmuch setup applies when
//! nothing is configured.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::config::NotmuchConfig;
use crate::{quote_term, ArcDatabase, Database, Error, IndexProvider, Message, Page, Result, Thread};

const FORMAT_VERSION: &str = "--format-version=4";

/// How many thread ids are packed in a single follow-up query
const THREAD_BATCH: usize = 64;

pub struct NotmuchProvider {
    config: NotmuchConfig,
}

impl NotmuchProvider {
    pub fn new(config: NotmuchConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl IndexProvider for NotmuchProvider {
    async fn open(&self) -> Result<ArcDatabase> {
        if let Some(path) = self.config.database_path.as_ref() {
            match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_dir() => (),
                Ok(_) => {
                    return Err(Error::Unavailable(format!(
                        "{} is not a directory",
                        path.display()
                    )))
                }
                Err(e) => {
                    return Err(Error::Unavailable(format!("{}: {}", path.display(), e)))
                }
            }
        }

        Ok(Arc::new(NotmuchDatabase {
            config: self.config.clone(),
        }))
    }
}

pub struct NotmuchDatabase {
    config: NotmuchConfig,
}

impl NotmuchDatabase {
    async fn run(&self, args: &[String]) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = self.config.database_path.as_ref() {
            cmd.env("NOTMUCH_DATABASE", path);
        }
        if let Some(path) = self.config.config_path.as_ref() {
            cmd.env("NOTMUCH_CONFIG", path);
        }

        tracing::debug!(binary = %self.config.binary, ?args, "querying notmuch");
        let output = cmd.output().await.map_err(|e| {
            Error::Unavailable(format!("unable to run {}: {}", self.config.binary, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = ?output.status, %stderr, "notmuch failed");
            if is_database_error(&stderr) {
                return Err(Error::Unavailable(stderr));
            }
            return Err(Error::Query(stderr));
        }

        Ok(output.stdout)
    }

    async fn summaries(&self, query: &str, sort: &str, page: Page) -> Result<Vec<Summary>> {
        let mut args = vec![
            "search".to_string(),
            "--format=json".to_string(),
            FORMAT_VERSION.to_string(),
            "--output=summary".to_string(),
            "--exclude=false".to_string(),
            format!("--sort={}", sort),
        ];
        if page.offset > 0 {
            args.push(format!("--offset={}", page.offset));
        }
        if let Some(limit) = page.limit {
            args.push(format!("--limit={}", limit));
        }
        args.push("--".to_string());
        args.push(query.to_string());

        parse_summaries(&self.run(&args).await?)
    }

    /// The summary timestamp of a newest-first search is the newest date
    /// of the matched messages of a thread, the oldest one comes from an
    /// oldest-first search restricted to the same query.
    async fn oldest_dates(&self, query: &str, thread_ids: &[&str]) -> Result<HashMap<String, i64>> {
        let mut dates = HashMap::new();
        for batch in thread_ids.chunks(THREAD_BATCH) {
            let threads = batch
                .iter()
                .map(|id| format!("thread:{}", quote_term(id)))
                .collect::<Vec<_>>()
                .join(" or ");
            let restricted = match query.trim() {
                "" | "*" => threads,
                q => format!("({}) and ({})", q, threads),
            };
            for s in self.summaries(&restricted, "oldest-first", Page::all()).await? {
                dates.insert(s.thread, s.timestamp);
            }
        }
        Ok(dates)
    }

    async fn show(&self, query: &str) -> Result<Vec<ShowMessage>> {
        let args = vec![
            "show".to_string(),
            "--format=json".to_string(),
            FORMAT_VERSION.to_string(),
            "--body=false".to_string(),
            "--entire-thread=false".to_string(),
            "--exclude=false".to_string(),
            "--".to_string(),
            query.to_string(),
        ];
        parse_show(&self.run(&args).await?)
    }

    async fn thread_of(&self, message_id: &str) -> Result<Option<String>> {
        let args = vec![
            "search".to_string(),
            "--format=json".to_string(),
            FORMAT_VERSION.to_string(),
            "--output=threads".to_string(),
            "--exclude=false".to_string(),
            "--".to_string(),
            format!("id:{}", quote_term(message_id)),
        ];
        let threads: Vec<String> = serde_json::from_slice(&self.run(&args).await?)?;
        Ok(threads
            .into_iter()
            .next()
            .map(|t| t.trim_start_matches("thread:").to_string()))
    }
}

#[async_trait]
impl Database for NotmuchDatabase {
    async fn search_threads(&self, query: &str, page: Page) -> Result<Vec<Thread>> {
        let newest = self.summaries(query, "newest-first", page).await?;
        if newest.is_empty() {
            return Ok(vec![]);
        }

        let ids = newest.iter().map(|s| s.thread.as_str()).collect::<Vec<_>>();
        let oldest = self.oldest_dates(query, &ids).await?;

        Ok(newest
            .into_iter()
            .map(|s| {
                let oldest_date = oldest.get(&s.thread).copied().unwrap_or(s.timestamp);
                s.into_thread(oldest_date)
            })
            .collect())
    }

    async fn thread_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let mut found = self
            .show(&format!("thread:{}", quote_term(thread_id)))
            .await?;
        if found.is_empty() {
            return Err(Error::NotFound(format!("thread {}", thread_id)));
        }

        // the tree is in reply order, flatten it to date order
        found.sort_by_key(|m| m.timestamp);
        Ok(found
            .into_iter()
            .map(|m| m.into_message(thread_id.to_string()))
            .collect())
    }

    async fn find_message(&self, message_id: &str) -> Result<Message> {
        let found = self
            .show(&format!("id:{}", quote_term(message_id)))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("message {}", message_id)))?;
        let thread_id = self.thread_of(message_id).await?.unwrap_or_default();
        Ok(found.into_message(thread_id))
    }

    async fn message_source(&self, message: &Message) -> Result<Vec<u8>> {
        match tokio::fs::read(&message.filename).await {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(format!(
                "file {} of message {}",
                message.filename.display(),
                message.message_id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_database_error(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("open database") || lower.contains("locate database")
}

// ---- notmuch JSON output

/// One entry of `notmuch search --output=summary`
#[derive(Deserialize, Debug)]
struct Summary {
    thread: String,
    timestamp: i64,
    matched: u32,
    total: u32,
    #[serde(default)]
    authors: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl Summary {
    fn into_thread(self, oldest_date: i64) -> Thread {
        Thread {
            thread_id: self.thread,
            authors: self.authors,
            subject: self.subject,
            newest_date: self.timestamp,
            oldest_date,
            matched_messages: self.matched,
            total_messages: self.total,
            tags: self.tags,
        }
    }
}

/// A node of the `notmuch show` forest: the message (null when it did not
/// match the query) and its replies.
#[derive(Deserialize, Debug)]
struct ShowNode(Option<ShowMessage>, Vec<ShowNode>);

#[derive(Deserialize, Debug)]
struct ShowMessage {
    id: String,
    filename: Filenames,
    timestamp: i64,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Filenames {
    Many(Vec<PathBuf>),
    One(PathBuf),
}

impl ShowMessage {
    fn into_message(self, thread_id: String) -> Message {
        let filename = match self.filename {
            Filenames::One(f) => f,
            Filenames::Many(f) => f.into_iter().next().unwrap_or_default(),
        };
        Message {
            message_id: self.id,
            thread_id,
            filename,
            timestamp: self.timestamp,
            tags: self.tags,
        }
    }
}

fn parse_summaries(raw: &[u8]) -> Result<Vec<Summary>> {
    Ok(serde_json::from_slice(raw)?)
}

fn parse_show(raw: &[u8]) -> Result<Vec<ShowMessage>> {
    let threads: Vec<Vec<ShowNode>> = serde_json::from_slice(raw)?;
    let mut out = vec![];
    for forest in threads {
        flatten(forest, &mut out);
    }
    Ok(out)
}

fn flatten(nodes: Vec<ShowNode>, out: &mut Vec<ShowMessage>) {
    for ShowNode(msg, replies) in nodes {
        if let Some(m) = msg {
            out.push(m);
        }
        flatten(replies, out);
    }
}
