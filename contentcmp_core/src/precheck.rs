use crate::report::ComparisonReport;
use contentcmp_common::FileOutcome;
use tracing::debug;

/// Result of the cheap whole-content check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precheck {
    /// Contents are byte-identical; line alignment can be skipped
    CertainMatch,
    /// Line alignment must decide
    Inconclusive,
}

/// Split resolved text into lines. Interior empty lines are kept; a single
/// trailing line terminator does not produce an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Content with no usable lines
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Compare byte length and line count, recording a file-level outcome for
/// each that differs. Both may fire.
pub fn precheck(
    expected: &str,
    actual: &str,
    expected_lines: usize,
    actual_lines: usize,
    report: &mut ComparisonReport,
) -> Precheck {
    if expected == actual {
        debug!("Contents are byte-identical ({} bytes)", expected.len());
        return Precheck::CertainMatch;
    }

    if expected.len() != actual.len() {
        report.push_file_outcome(FileOutcome::size_differs(expected.len(), actual.len()));
    }
    if expected_lines != actual_lines {
        report.push_file_outcome(FileOutcome::line_count_differs(expected_lines, actual_lines));
    }

    Precheck::Inconclusive
}
