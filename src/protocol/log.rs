//! `log` namespace: console and JavaScript error entries.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::identifiers::BrowsingContext;

use super::script::{RemoteValue, Source, StackTrace};
use super::tag_literal;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Fields common to every log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLogEntry {
    pub level: Level,
    pub source: Source,
    pub text: Option<String>,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,
}

tag_literal!(
    /// `type` of a [`ConsoleLogEntry`].
    ConsoleTag => "console"
);

tag_literal!(
    /// `type` of a [`JavascriptLogEntry`].
    JavascriptTag => "javascript"
);

/// Entry produced by a `console.*` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLogEntry {
    #[serde(rename = "type")]
    pub kind: ConsoleTag,
    #[serde(flatten)]
    pub base: BaseLogEntry,
    /// Console method, such as `log` or `warn`.
    pub method: String,
    pub args: Vec<RemoteValue>,
}

/// Uncaught JavaScript error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JavascriptLogEntry {
    #[serde(rename = "type")]
    pub kind: JavascriptTag,
    #[serde(flatten)]
    pub base: BaseLogEntry,
}

/// Entry of any other `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericLogEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub base: BaseLogEntry,
}

/// `log.entryAdded` params.
///
/// Entries whose `type` is neither `console` nor `javascript` decode as
/// [`Entry::Generic`].
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Console(ConsoleLogEntry),
    Javascript(JavascriptLogEntry),
    Generic(GenericLogEntry),
}

impl Entry {
    #[must_use]
    pub fn base(&self) -> &BaseLogEntry {
        match self {
            Self::Console(entry) => &entry.base,
            Self::Javascript(entry) => &entry.base,
            Self::Generic(entry) => &entry.base,
        }
    }

    /// Returns the wire `type`.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Console(_) => "console",
            Self::Javascript(_) => "javascript",
            Self::Generic(entry) => &entry.kind,
        }
    }

    #[inline]
    #[must_use]
    pub fn level(&self) -> Level {
        self.base().level
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.base().text.as_deref()
    }

    /// Returns the context that produced the entry, if any.
    #[inline]
    #[must_use]
    pub fn context(&self) -> Option<&BrowsingContext> {
        self.base().source.context.as_ref()
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Console(entry) => entry.serialize(serializer),
            Self::Javascript(entry) => entry.serialize(serializer),
            Self::Generic(entry) => entry.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let entry = match value.get("type").and_then(Value::as_str) {
            Some("console") => serde_json::from_value(value).map(Self::Console),
            Some("javascript") => serde_json::from_value(value).map(Self::Javascript),
            _ => serde_json::from_value(value).map(Self::Generic),
        };
        entry.map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn entry(kind: &str) -> Value {
        json!({
            "type": kind,
            "level": "info",
            "source": {"realm": "r", "context": "c"},
            "text": "hello",
            "timestamp": 5
        })
    }

    #[test]
    fn test_console_entry() {
        let mut json = entry("console");
        json["method"] = json!("log");
        json["args"] = json!([{"type": "string", "value": "hello"}]);

        let parsed: Entry = serde_json::from_value(json.clone()).expect("decode");
        let Entry::Console(console) = &parsed else {
            panic!("expected console entry");
        };
        assert_eq!(console.method, "log");
        assert_eq!(parsed.context().map(BrowsingContext::as_str), Some("c"));
        assert_eq!(serde_json::to_value(&parsed).expect("encode"), json);
    }

    #[test]
    fn test_unknown_type_is_generic() {
        let parsed: Entry = serde_json::from_value(entry("network")).expect("decode");
        assert!(matches!(parsed, Entry::Generic(_)));
        assert_eq!(parsed.kind(), "network");
        assert_eq!(parsed.level(), Level::Info);
        assert_eq!(parsed.text(), Some("hello"));
    }

    #[test]
    fn test_null_text() {
        let mut json = entry("javascript");
        json["text"] = Value::Null;
        let parsed: Entry = serde_json::from_value(json.clone()).expect("decode");
        assert!(matches!(parsed, Entry::Javascript(_)));
        assert_eq!(parsed.text(), None);
        assert_eq!(serde_json::to_value(&parsed).expect("encode"), json);
    }
}
