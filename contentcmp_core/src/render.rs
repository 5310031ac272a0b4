//! Renderings of a [`ComparisonReport`]. Every renderer reads the recorded
//! outcomes only; nothing is compared again.

use crate::report::{format_percent, ComparisonReport};
use contentcmp_common::{CompareError, FileOutcome, LineKind, LineOutcome};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::fmt;
use std::str::FromStr;

pub const MESSAGE_WIDTH: usize = 40;
pub const FLAG_WIDTH: usize = 2;
pub const LINE_NO_WIDTH: usize = 5;
pub const CONTENT_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Html,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => f.write_str("text"),
            ReportFormat::Json => f.write_str("json"),
            ReportFormat::Html => f.write_str("html"),
            ReportFormat::Csv => f.write_str("csv"),
        }
    }
}

/// Render in the given format. `quote_csv` only affects [`ReportFormat::Csv`].
pub fn render(
    report: &ComparisonReport,
    format: ReportFormat,
    quote_csv: bool,
) -> Result<String, CompareError> {
    match format {
        ReportFormat::Text => Ok(to_plain_text(report)),
        ReportFormat::Json => to_json(report),
        ReportFormat::Html => Ok(to_html(report)),
        ReportFormat::Csv => to_csv(report, quote_csv),
    }
}

/// Pad `value` to `width` chars, clipping it first so at least one space is
/// left before the next column. A clipped value ends with `~`.
fn fit(value: &str, width: usize) -> String {
    let room = width.saturating_sub(1);
    let mut cell: String = if value.chars().count() > room {
        let mut clipped: String = value.chars().take(room.saturating_sub(1)).collect();
        clipped.push('~');
        clipped
    } else {
        value.to_string()
    };
    let used = cell.chars().count();
    cell.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    cell
}

fn line_row(message: &str, flag: &str, line_no: usize, content: &str) -> String {
    let mut row = fit(message, MESSAGE_WIDTH);
    row.push_str(&fit(flag, FLAG_WIDTH));
    row.push_str(&fit(&line_no.to_string(), LINE_NO_WIDTH));
    row.push_str(&fit(content, CONTENT_WIDTH));
    row.trim_end().to_string()
}

fn file_row(message: &str, flag: &str, content: &str) -> String {
    let mut row = fit(message, MESSAGE_WIDTH);
    row.push_str(&fit(flag, FLAG_WIDTH));
    row.push_str(&fit(content, CONTENT_WIDTH));
    row.trim_end().to_string()
}

/// Fixed-width listing with legend and summary footer
pub fn to_plain_text(report: &ComparisonReport) -> String {
    let rule = "=".repeat(MESSAGE_WIDTH + FLAG_WIDTH + LINE_NO_WIDTH + CONTENT_WIDTH);
    let mut out = Vec::new();

    out.push(format!(
        "Content Comparison ({}) - {}",
        report.mode(),
        report.created_at().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push(rule.clone());

    if !report.file_outcomes().is_empty() {
        out.push("File-level".to_string());
        out.push("-".repeat(rule.len()));
        for outcome in report.file_outcomes() {
            out.push(file_row(&outcome.message, "E", &outcome.expected));
            out.push(file_row("", "A", &outcome.actual));
        }
        out.push(String::new());
    }

    let lines: Vec<&LineOutcome> = report.visible_lines().collect();
    if !lines.is_empty() {
        out.push("Line-by-line".to_string());
        out.push("-".repeat(rule.len()));
        for line in lines {
            out.push(line_row(line.note(), "E", line.expected_line(), line.expected_text()));
            let mut notes = line.extra_notes().iter();
            let first = notes.next().map(String::as_str).unwrap_or("");
            out.push(line_row(first, "A", line.actual_line(), line.actual_text()));
            for note in notes {
                out.push(note.clone());
            }
        }
        out.push(String::new());
    }

    out.push(rule.clone());
    out.push("Legend: E = EXPECTED, A = ACTUAL".to_string());
    out.push(format!(
        "Summary: {} matched, {} mismatched, match {}, mismatch {}",
        report.match_count(),
        report.mismatch_count(),
        format_percent(report.match_percent()),
        format_percent(report.mismatch_percent())
    ));
    out.push(rule);

    let mut text = out.join("\n");
    text.push('\n');
    text
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: Vec<JsonSummaryEntry<'a>>,
    details: Vec<&'a LineOutcome>,
    statistics: String,
}

#[derive(Serialize)]
struct JsonSummaryEntry<'a> {
    message: &'a str,
    expected: &'a str,
    actual: &'a str,
}

impl<'a> From<&'a FileOutcome> for JsonSummaryEntry<'a> {
    fn from(outcome: &'a FileOutcome) -> Self {
        Self {
            message: &outcome.message,
            expected: &outcome.expected,
            actual: &outcome.actual,
        }
    }
}

/// JSON document with `summary`, `details` and `statistics`
pub fn to_json(report: &ComparisonReport) -> Result<String, CompareError> {
    let document = JsonReport {
        summary: report.file_outcomes().iter().map(JsonSummaryEntry::from).collect(),
        details: report.visible_lines().collect(),
        statistics: report.statistics(),
    };
    serde_json::to_string_pretty(&document).map_err(|e| CompareError::Serialization(e.to_string()))
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap the char runs that differ between the two sides in `<mark>`.
/// Returns the (expected, actual) cell contents.
fn highlight_pair(expected: &str, actual: &str) -> (String, String) {
    let diff = TextDiff::from_chars(expected, actual);
    let mut left = String::new();
    let mut right = String::new();

    for change in diff.iter_all_changes() {
        let text = escape_html(&change.to_string());
        match change.tag() {
            ChangeTag::Equal => {
                left.push_str(&text);
                right.push_str(&text);
            }
            ChangeTag::Delete => left.push_str(&format!("<mark>{text}</mark>")),
            ChangeTag::Insert => right.push_str(&format!("<mark>{text}</mark>")),
        }
    }

    (left, right)
}

/// HTML table markup; MISMATCH rows highlight the differing characters
pub fn to_html(report: &ComparisonReport) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"comparison\">\n");

    if !report.file_outcomes().is_empty() {
        html.push_str("<table class=\"file-outcomes\">\n");
        html.push_str("<tr><th>Message</th><th>Expected</th><th>Actual</th></tr>\n");
        for outcome in report.file_outcomes() {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&outcome.message),
                escape_html(&outcome.expected),
                escape_html(&outcome.actual)
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("<table class=\"line-outcomes\">\n");
    html.push_str(
        "<tr><th>Expected line</th><th>Actual line</th><th>Kind</th><th>Note</th>\
         <th>Expected</th><th>Actual</th></tr>\n",
    );
    for line in report.visible_lines() {
        let (expected, actual) = if line.kind() == LineKind::Mismatch {
            highlight_pair(line.expected_text(), line.actual_text())
        } else {
            (escape_html(line.expected_text()), escape_html(line.actual_text()))
        };
        let mut note = escape_html(line.note());
        for extra in line.extra_notes() {
            note.push_str("<br/>");
            note.push_str(&escape_html(extra));
        }
        html.push_str(&format!(
            concat!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td>",
                "<td>{}</td><td>{}</td><td>{}</td></tr>\n"
            ),
            line.kind().label().to_ascii_lowercase(),
            line.expected_line(),
            line.actual_line(),
            line.kind().label(),
            note,
            expected,
            actual
        ));
    }
    html.push_str("</table>\n");

    html.push_str(&format!(
        "<p class=\"statistics\">{}</p>\n</div>\n",
        escape_html(&report.statistics())
    ));
    html
}

pub(crate) fn csv_writer(quote: bool) -> csv::Writer<Vec<u8>> {
    let style = if quote {
        csv::QuoteStyle::Always
    } else {
        csv::QuoteStyle::Necessary
    };
    csv::WriterBuilder::new().quote_style(style).from_writer(Vec::new())
}

pub(crate) fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String, CompareError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| CompareError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CompareError::Serialization(e.to_string()))
}

/// CSV listing; file-level outcomes come first with kind `FILE`
pub fn to_csv(report: &ComparisonReport, quote: bool) -> Result<String, CompareError> {
    let mut writer = csv_writer(quote);
    let map_err = |e: csv::Error| CompareError::Serialization(e.to_string());

    writer
        .write_record(["kind", "expected line", "actual line", "note", "expected", "actual"])
        .map_err(map_err)?;
    for outcome in report.file_outcomes() {
        writer
            .write_record([
                "FILE",
                "",
                "",
                outcome.message.as_str(),
                outcome.expected.as_str(),
                outcome.actual.as_str(),
            ])
            .map_err(map_err)?;
    }
    for line in report.visible_lines() {
        let mut note = line.note().to_string();
        for extra in line.extra_notes() {
            note.push_str("; ");
            note.push_str(extra);
        }
        writer
            .write_record([
                line.kind().label(),
                line.expected_line().to_string().as_str(),
                line.actual_line().to_string().as_str(),
                note.as_str(),
                line.expected_text(),
                line.actual_text(),
            ])
            .map_err(map_err)?;
    }

    finish_csv(writer)
}
