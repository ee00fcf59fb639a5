use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::bot::error::TransportError;
use crate::bot::message::{Message, RawMessage};

/// Kinds of incoming messages, in the order they are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Mentions,
    Searches,
    DirectMessages,
}

impl Category {
    pub const ORDER: [Category; 3] = [
        Category::Mentions,
        Category::Searches,
        Category::DirectMessages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Mentions => "mentions",
            Category::Searches => "searches",
            Category::DirectMessages => "direct_messages",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest<'a> {
    pub category: Category,
    /// Only messages with a greater id.
    pub since: Option<u64>,
    /// Search expression, for `Category::Searches`.
    pub query: Option<&'a str>,
}

/// The social platform, as seen by the bot.
///
/// `fetch` returns messages in ascending id order.
pub trait Transport {
    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Message>, TransportError>;
    fn post(&mut self, text: &str, in_reply_to: &Message) -> Result<(), TransportError>;
}

/// `"ISS" OR "HST"`: every term quoted, joined with OR.
pub fn search_query(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// File-backed transport: `<spool>/<category>.json` holds a JSON array of raw
/// platform records; replies are appended to `<spool>/outbox.jsonl`.
pub struct SpoolTransport {
    dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct OutboxRecord<'a> {
    in_reply_to: u64,
    to: &'a str,
    text: &'a str,
    posted_at: i64,
}

impl SpoolTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn inbox_path(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{}.json", category.as_str()))
    }

    fn outbox_path(&self) -> PathBuf {
        self.dir.join("outbox.jsonl")
    }
}

impl Transport for SpoolTransport {
    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Message>, TransportError> {
        let path = self.inbox_path(request.category);
        if !path.exists() {
            log::debug!("No spool file {}", path.display());
            return Ok(Vec::new());
        }

        let raw: Vec<RawMessage> = serde_json::from_str(&fs::read_to_string(&path)?)?;
        let mut messages = Vec::with_capacity(raw.len());
        for record in raw {
            match Message::try_from(record) {
                Ok(message) if request.since.map_or(true, |since| message.id > since) => {
                    messages.push(message)
                }
                Ok(_) => {}
                Err(e) => log::warn!("Dropping {} record: {}", request.category, e),
            }
        }
        messages.sort_by_key(|m| m.id);
        Ok(messages)
    }

    fn post(&mut self, text: &str, in_reply_to: &Message) -> Result<(), TransportError> {
        fs::create_dir_all(&self.dir)?;
        let record = OutboxRecord {
            in_reply_to: in_reply_to.id,
            to: &in_reply_to.author,
            text,
            posted_at: Utc::now().timestamp(),
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.outbox_path())?;
        writeln!(file, "{}", serde_json::to_string(&record)?)?;
        Ok(())
    }
}
