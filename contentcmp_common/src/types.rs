use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder rendered wherever one side of a line pair does not exist
pub const MISSING_TEXT: &str = "<MISSING>";

/// Which input a value, column or error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Expected,
    Actual,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Expected => f.write_str("EXPECTED"),
            Side::Actual => f.write_str("ACTUAL"),
        }
    }
}

/// Invocation policy for a text comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Stop at the first line that is not a perfect match
    FailFast,
    /// Run the full pass and produce a verdict
    #[default]
    Thorough,
    /// Run the full pass and produce only a transcript
    Diff,
}

impl CompareMode {
    pub fn stops_early(self) -> bool {
        self == CompareMode::FailFast
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareMode::FailFast => f.write_str("fail-fast"),
            CompareMode::Thorough => f.write_str("thorough"),
            CompareMode::Diff => f.write_str("diff"),
        }
    }
}

impl FromStr for CompareMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "fail-fast" | "failfast" => Ok(CompareMode::FailFast),
            "thorough" => Ok(CompareMode::Thorough),
            "diff" => Ok(CompareMode::Diff),
            other => Err(format!("unknown compare mode: {other}")),
        }
    }
}

/// Classification of a single line outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineKind {
    /// Both lines are byte-identical
    Matched,
    /// Both lines exist but differ
    Mismatch,
    /// Present in EXPECTED, absent at this position in ACTUAL
    Missing,
    /// Present in ACTUAL, absent at this position in EXPECTED
    Added,
}

impl LineKind {
    pub fn label(self) -> &'static str {
        match self {
            LineKind::Matched => "MATCHED",
            LineKind::Mismatch => "MISMATCH",
            LineKind::Missing => "MISSING",
            LineKind::Added => "ADDED",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The outcome recorded for one EXPECTED line, one ACTUAL line, or a pair of them.
///
/// Outcomes are built once through the constructors below and are read-only
/// afterwards. Line numbers are 1-based. For MISSING and ADDED outcomes the
/// number on the absent side is the position of the other cursor at the time
/// the line was reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineOutcome {
    expected_line: usize,
    actual_line: usize,
    expected_text: String,
    actual_text: String,
    kind: LineKind,
    note: String,
    extra_notes: Vec<String>,
}

impl LineOutcome {
    pub fn matched(expected_line: usize, actual_line: usize, text: &str) -> Self {
        Self::pair(
            LineKind::Matched,
            expected_line,
            actual_line,
            text,
            text,
            "perfect match".to_string(),
        )
    }

    pub fn mismatch(
        expected_line: usize,
        actual_line: usize,
        expected_text: &str,
        actual_text: &str,
        note: impl Into<String>,
    ) -> Self {
        Self::pair(
            LineKind::Mismatch,
            expected_line,
            actual_line,
            expected_text,
            actual_text,
            note.into(),
        )
    }

    pub fn missing(expected_line: usize, actual_line: usize, expected_text: &str) -> Self {
        Self {
            expected_line,
            actual_line,
            expected_text: expected_text.to_string(),
            actual_text: MISSING_TEXT.to_string(),
            kind: LineKind::Missing,
            note: "missing in ACTUAL".to_string(),
            extra_notes: Vec::new(),
        }
    }

    pub fn added(expected_line: usize, actual_line: usize, actual_text: &str) -> Self {
        Self {
            expected_line,
            actual_line,
            expected_text: MISSING_TEXT.to_string(),
            actual_text: actual_text.to_string(),
            kind: LineKind::Added,
            note: "missing in EXPECTED".to_string(),
            extra_notes: Vec::new(),
        }
    }

    fn pair(
        kind: LineKind,
        expected_line: usize,
        actual_line: usize,
        expected_text: &str,
        actual_text: &str,
        note: String,
    ) -> Self {
        let mut extra_notes = Vec::new();
        if expected_line != actual_line {
            extra_notes.push(format!(
                "EXPECTED line {expected_line} realigned to ACTUAL line {actual_line}"
            ));
        }
        Self {
            expected_line,
            actual_line,
            expected_text: expected_text.to_string(),
            actual_text: actual_text.to_string(),
            kind,
            note,
            extra_notes,
        }
    }

    pub fn expected_line(&self) -> usize {
        self.expected_line
    }

    pub fn actual_line(&self) -> usize {
        self.actual_line
    }

    pub fn expected_text(&self) -> &str {
        &self.expected_text
    }

    pub fn actual_text(&self) -> &str {
        &self.actual_text
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn extra_notes(&self) -> &[String] {
        &self.extra_notes
    }

    /// A MATCHED or MISMATCH pair whose two sides sit on different line numbers
    pub fn is_realigned(&self) -> bool {
        matches!(self.kind, LineKind::Matched | LineKind::Mismatch)
            && self.expected_line != self.actual_line
    }
}

/// Kind of a whole-content observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileOutcomeKind {
    SizeDiffers,
    LineCountDiffers,
    ContentEmpty,
}

/// A file-level observation; these never touch the line counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub kind: FileOutcomeKind,
    pub message: String,
    pub expected: String,
    pub actual: String,
    /// Whether this observation alone makes the comparison fail
    pub discrepancy: bool,
}

impl FileOutcome {
    pub fn size_differs(expected_bytes: usize, actual_bytes: usize) -> Self {
        Self {
            kind: FileOutcomeKind::SizeDiffers,
            message: "content size differs".to_string(),
            expected: format!("{expected_bytes} bytes"),
            actual: format!("{actual_bytes} bytes"),
            discrepancy: true,
        }
    }

    pub fn line_count_differs(expected_lines: usize, actual_lines: usize) -> Self {
        Self {
            kind: FileOutcomeKind::LineCountDiffers,
            message: "line count differs".to_string(),
            expected: format!("{expected_lines} lines"),
            actual: format!("{actual_lines} lines"),
            discrepancy: true,
        }
    }

    pub fn content_empty(expected_blank: bool, actual_blank: bool) -> Self {
        let message = match (expected_blank, actual_blank) {
            (true, true) => "content is empty".to_string(),
            (true, false) => format!("{} content is empty", Side::Expected),
            _ => format!("{} content is empty", Side::Actual),
        };
        let describe = |blank: bool| if blank { "<empty>" } else { "<not empty>" }.to_string();
        Self {
            kind: FileOutcomeKind::ContentEmpty,
            message,
            expected: describe(expected_blank),
            actual: describe(actual_blank),
            discrepancy: expected_blank != actual_blank,
        }
    }
}

/// Pass/fail result of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
    /// DIFF mode never produces a verdict
    NotApplicable,
}

/// Column labels used by tabular discrepancy reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabels {
    #[serde(default = "default_field_label")]
    pub mismatched_field: String,
    #[serde(default = "default_expected_label")]
    pub expected: String,
    #[serde(default = "default_actual_label")]
    pub actual: String,
}

fn default_field_label() -> String {
    "MISMATCHED FIELD".to_string()
}

fn default_expected_label() -> String {
    "EXPECTED".to_string()
}

fn default_actual_label() -> String {
    "ACTUAL".to_string()
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self {
            mismatched_field: default_field_label(),
            expected: default_expected_label(),
            actual: default_actual_label(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Default mode for text comparisons
    #[serde(default)]
    pub mode: CompareMode,

    /// List MATCHED lines in the plain-text rendering
    #[serde(default)]
    pub verbose: bool,

    /// Joins multi-column identity values into one key
    #[serde(default = "default_identity_separator")]
    pub identity_separator: String,

    /// Double-quote every cell of CSV renderings
    #[serde(default)]
    pub quote_csv: bool,

    #[serde(default)]
    pub labels: ColumnLabels,
}

pub fn default_identity_separator() -> String {
    "^".to_string()
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            mode: CompareMode::default(),
            verbose: false,
            identity_separator: default_identity_separator(),
            quote_csv: false,
            labels: ColumnLabels::default(),
        }
    }
}
