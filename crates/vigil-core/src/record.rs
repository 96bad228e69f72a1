use crate::error::{Result, VigilError};
use crate::{io, paths};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

const DELIMITER: &str = "---";
const STATUS_PENDING: &str = "pending";
const RESERVED_KEYS: [&str; 2] = ["type", "status"];

// ---------------------------------------------------------------------------
// HeaderValue
// ---------------------------------------------------------------------------

/// A scalar header value. Rendering keeps the type recoverable on parse:
/// booleans are `true`/`false`, floats always carry a decimal point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl HeaderValue {
    /// Recover a typed value from its rendered text.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => return HeaderValue::Bool(true),
            "false" => return HeaderValue::Bool(false),
            _ => {}
        }
        if let Ok(n) = raw.parse::<i64>() {
            return HeaderValue::Int(n);
        }
        let numeric = raw.chars().any(|c| c.is_ascii_digit())
            && raw
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
        if numeric {
            if let Ok(f) = raw.parse::<f64>() {
                return HeaderValue::Float(f);
            }
        }
        HeaderValue::Str(raw.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HeaderValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // One key per line: embedded line breaks would end the value early.
            HeaderValue::Str(s) => f.write_str(&s.replace(['\r', '\n'], " ")),
            HeaderValue::Int(n) => write!(f, "{n}"),
            HeaderValue::Float(x) => write!(f, "{x:?}"),
            HeaderValue::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Str(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Str(s)
    }
}

impl From<&String> for HeaderValue {
    fn from(s: &String) -> Self {
        HeaderValue::Str(s.clone())
    }
}

impl From<i64> for HeaderValue {
    fn from(n: i64) -> Self {
        HeaderValue::Int(n)
    }
}

impl From<u32> for HeaderValue {
    fn from(n: u32) -> Self {
        HeaderValue::Int(i64::from(n))
    }
}

impl From<u64> for HeaderValue {
    fn from(n: u64) -> Self {
        HeaderValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for HeaderValue {
    fn from(x: f64) -> Self {
        HeaderValue::Float(x)
    }
}

impl From<bool> for HeaderValue {
    fn from(b: bool) -> Self {
        HeaderValue::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Ordered key/value metadata block. Keys keep insertion order; setting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    entries: Vec<(String, HeaderValue)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<HeaderValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render the delimited block, closing delimiter and trailing blank line included.
    pub fn render(&self) -> String {
        let mut out = String::from(DELIMITER);
        out.push('\n');
        for (key, value) in &self.entries {
            out.push_str(&format!("{key}: {value}\n"));
        }
        out.push_str(DELIMITER);
        out.push_str("\n\n");
        out
    }
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// RecordBody
// ---------------------------------------------------------------------------

/// Markdown body skeleton shared by every action record: a title, the
/// description sections, a suggested-action checklist and a notes section.
#[derive(Debug, Clone)]
pub struct RecordBody {
    title: String,
    sections: Vec<(String, String)>,
    actions: Vec<String>,
    notes: String,
    footer: Option<String>,
}

impl RecordBody {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
            actions: Vec::new(),
            notes: "Add your analysis here.".to_string(),
            footer: None,
        }
    }

    pub fn section(mut self, heading: impl Into<String>, text: impl Into<String>) -> Self {
        self.sections.push((heading.into(), text.into()));
        self
    }

    pub fn action(mut self, item: impl Into<String>) -> Self {
        self.actions.push(item.into());
        self
    }

    pub fn actions<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn notes(mut self, text: impl Into<String>) -> Self {
        self.notes = text.into();
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("# {}\n", self.title);
        for (heading, text) in &self.sections {
            out.push_str(&format!("\n## {heading}\n{text}\n"));
        }
        out.push_str("\n## Suggested Actions\n");
        for item in &self.actions {
            out.push_str(&format!("- [ ] {item}\n"));
        }
        out.push_str(&format!("\n## Notes\n{}\n", self.notes));
        if let Some(footer) = &self.footer {
            out.push_str(&format!("\n---\n*{footer}*\n"));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// ActionRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordHandle {
    pub filename: String,
    pub path: PathBuf,
}

/// One actionable event, written once to `Needs_Action` and never touched
/// again by the watchers.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    filename: String,
    header: Header,
    body: String,
}

impl ActionRecord {
    /// Start a record of the given `type`. The header opens with `type` and
    /// `status: pending`; `filename` is sanitised for the filesystem and has no
    /// extension.
    pub fn new(kind: &str, filename: &str) -> Self {
        let mut header = Header::new();
        header.set("type", kind);
        header.set("status", STATUS_PENDING);
        Self {
            filename: paths::safe_filename(filename),
            header,
            body: String::new(),
        }
    }

    /// Add a header field. `type` and `status` are fixed at construction and
    /// are left untouched.
    pub fn field(mut self, key: &str, value: impl Into<HeaderValue>) -> Self {
        if RESERVED_KEYS.contains(&key) {
            tracing::debug!(key, "ignoring reserved header key");
            return self;
        }
        self.header.set(key, value);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn body_text(&self) -> &str {
        &self.body
    }

    pub fn render(&self) -> String {
        let mut out = self.header.render();
        out.push_str(&self.body);
        out
    }

    /// Write `<dir>/<filename>.md`. Re-deriving a record for the same item
    /// yields the same name, so a second write replaces the first.
    pub fn write(&self, dir: &Path) -> Result<RecordHandle> {
        let path = paths::record_path(dir, &self.filename);
        if path.exists() {
            tracing::debug!(path = %path.display(), "overwriting existing action file");
        }
        io::atomic_write(&path, self.render().as_bytes())?;
        tracing::info!(path = %path.display(), "created action file");
        Ok(RecordHandle {
            filename: self.filename.clone(),
            path,
        })
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ParsedRecord {
    pub header: Header,
    pub body: String,
}

impl ParsedRecord {
    pub fn kind(&self) -> Option<&str> {
        self.header.get_str("type")
    }

    pub fn status(&self) -> Option<&str> {
        self.header.get_str("status")
    }
}

/// Parse an action file back into its typed header and body.
pub fn parse(text: &str) -> Result<ParsedRecord> {
    let text = text.replace("\r\n", "\n");
    let rest = text
        .strip_prefix("---\n")
        .ok_or_else(|| VigilError::InvalidRecord("missing opening '---'".to_string()))?;

    let (block, body) = if let Some(block) = rest.strip_prefix("---\n") {
        ("", block)
    } else if let Some(idx) = rest.find("\n---\n") {
        (&rest[..idx], &rest[idx + 5..])
    } else if let Some(block) = rest.strip_suffix("\n---") {
        (block, "")
    } else {
        return Err(VigilError::InvalidRecord(
            "missing closing '---'".to_string(),
        ));
    };

    let mut header = Header::new();
    for line in block.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| VigilError::InvalidRecord(format!("not a 'key: value' line: {line}")))?;
        let value = value.strip_prefix(' ').unwrap_or(value);
        header.set(key.trim(), HeaderValue::parse(value));
    }

    let body = body.strip_prefix('\n').unwrap_or(body).to_string();
    Ok(ParsedRecord { header, body })
}

/// Parse the record at `path`.
pub fn read(path: &Path) -> Result<ParsedRecord> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
