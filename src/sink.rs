use crate::csp::FieldValue;
use crate::metadata::Metadata;
use std::fmt;
use std::sync::Mutex;

/// One accepted violation, ready to be written out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogRecord {
    pub path: String,
    pub metadata: Metadata,
    pub document_uri: String,
    pub referrer: String,
    pub blocked_uri: String,
    pub violated_directive: String,
    pub effective_directive: String,
    pub original_policy: String,
    pub disposition: String,
    pub script_sample: String,
    pub source_file: String,
    pub status_code: Option<FieldValue>,
    pub line_number: Option<FieldValue>,
    pub column_number: Option<FieldValue>,
}

impl LogRecord {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("path", self.path.clone()),
            ("metadata", self.metadata.to_string()),
            ("document_uri", self.document_uri.clone()),
            ("referrer", self.referrer.clone()),
            ("blocked_uri", self.blocked_uri.clone()),
            ("violated_directive", self.violated_directive.clone()),
            ("effective_directive", self.effective_directive.clone()),
            ("original_policy", self.original_policy.clone()),
            ("disposition", self.disposition.clone()),
            ("script_sample", self.script_sample.clone()),
            ("source_file", self.source_file.clone()),
            ("status_code", optional(&self.status_code)),
            ("line_number", optional(&self.line_number)),
            ("column_number", optional(&self.column_number)),
        ]
    }
}

/// Renders the record as a single logfmt line.
impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.fields().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={}", LogfmtValue::quoted(value))?;
        }
        Ok(())
    }
}

fn optional(value: &Option<FieldValue>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// A field value that keeps a logfmt line splittable on spaces.
///
/// Values containing whitespace, quotes, `=` or control characters are written
/// as an escaped, double-quoted string when quoting is on.
struct LogfmtValue<'a> {
    text: &'a str,
    quote: bool,
}

impl<'a> LogfmtValue<'a> {
    fn quoted(text: &'a str) -> LogfmtValue<'a> {
        LogfmtValue { text, quote: true }
    }
}

impl fmt::Display for LogfmtValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quote && needs_quoting(self.text) {
            write!(f, "{:?}", self.text)
        } else {
            f.write_str(self.text)
        }
    }
}

fn needs_quoting(value: &str) -> bool {
    value
        .chars()
        .any(|c| c.is_whitespace() || c == '"' || c == '=' || c.is_control())
}

/// Destination for accepted violation records.
pub trait ReportSink: Send + Sync {
    fn emit(&self, record: &LogRecord);
}

/// Writes records as `tracing` events.
///
/// The text formatter prints field values verbatim, so `TracingSink::text`
/// quotes them the way `LogRecord`'s logfmt rendering does. The JSON formatter
/// escapes on its own and gets the raw values.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    quote: bool,
}

impl TracingSink {
    pub fn text() -> TracingSink {
        TracingSink { quote: true }
    }

    pub fn json() -> TracingSink {
        TracingSink { quote: false }
    }
}

impl ReportSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        let v = |text: &str| -> String {
            LogfmtValue {
                text,
                quote: self.quote,
            }
            .to_string()
        };

        tracing::info!(
            path = %v(&record.path),
            metadata = %v(&record.metadata.to_string()),
            document_uri = %v(&record.document_uri),
            referrer = %v(&record.referrer),
            blocked_uri = %v(&record.blocked_uri),
            violated_directive = %v(&record.violated_directive),
            effective_directive = %v(&record.effective_directive),
            original_policy = %v(&record.original_policy),
            disposition = %v(&record.disposition),
            script_sample = %v(&record.script_sample),
            source_file = %v(&record.source_file),
            status_code = %v(&optional(&record.status_code)),
            line_number = %v(&optional(&record.line_number)),
            column_number = %v(&optional(&record.column_number)),
            "CSP violation"
        );
    }
}

/// Keeps rendered lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, record: &LogRecord) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(record.to_string());
        }
    }
}
