//! Two-cursor line alignment.
//!
//! The aligner walks EXPECTED and ACTUAL in lock-step. A pair the cascade in
//! [`crate::classify`] can explain is reported and both cursors advance. A
//! pair it cannot explain triggers a forward rescan: first through ACTUAL for
//! the EXPECTED line (lines skipped over are ADDED), then through EXPECTED
//! for the ACTUAL line (lines skipped over are MISSING). Only when neither
//! rescan finds a counterpart is the pair scored by edit distance.
//!
//! Rescans run to the end of the remaining sequence. This is a bounded
//! heuristic, not a minimal edit script, and pathological reorderings can be
//! reported differently than an LCS diff would report them.

use crate::classify::{classify, classify_pair, is_simple_match, Classification};
use crate::report::ComparisonReport;
use contentcmp_common::{LineKind, LineOutcome};
use tracing::debug;

/// How an alignment pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignStatus {
    /// Every line of both inputs was reported
    Completed,
    /// Stopped at the first outcome that was not a perfect match
    Stopped,
}

/// What to do with the pair under the cursors
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    /// Report the pair and advance both cursors
    Pair(Classification),
    /// ACTUAL lines before `found_at` are extra; EXPECTED resumes against `found_at`
    ActualInserted { found_at: usize },
    /// EXPECTED lines before `found_at` are absent; ACTUAL resumes against `found_at`
    ExpectedDropped { found_at: usize },
}

pub struct LineAligner<'a> {
    expected: &'a [&'a str],
    actual: &'a [&'a str],
    stop_on_first_mismatch: bool,
}

impl<'a> LineAligner<'a> {
    pub fn new(expected: &'a [&'a str], actual: &'a [&'a str]) -> Self {
        Self {
            expected,
            actual,
            stop_on_first_mismatch: false,
        }
    }

    pub fn stop_on_first_mismatch(mut self, enabled: bool) -> Self {
        self.stop_on_first_mismatch = enabled;
        self
    }

    /// Walk both sequences and append one outcome per line to `report`.
    pub fn run(&self, report: &mut ComparisonReport) -> AlignStatus {
        let (mut e, mut a) = (0usize, 0usize);

        while e < self.expected.len() {
            if a >= self.actual.len() {
                if self.record(report, LineOutcome::missing(e + 1, a + 1, self.expected[e])) {
                    return AlignStatus::Stopped;
                }
                e += 1;
                continue;
            }

            match self.resolve(e, a) {
                Resolution::Pair(classification) => {
                    if self.record(report, self.pair_outcome(e, a, &classification)) {
                        return AlignStatus::Stopped;
                    }
                    e += 1;
                    a += 1;
                }
                Resolution::ActualInserted { found_at } => {
                    debug!(
                        "EXPECTED line {} found at ACTUAL line {}, {} line(s) added",
                        e + 1,
                        found_at + 1,
                        found_at - a
                    );
                    for extra in a..found_at {
                        let outcome = LineOutcome::added(e + 1, extra + 1, self.actual[extra]);
                        if self.record(report, outcome) {
                            return AlignStatus::Stopped;
                        }
                    }
                    let classification = classify_pair(self.expected[e], self.actual[found_at]);
                    if self.record(report, self.pair_outcome(e, found_at, &classification)) {
                        return AlignStatus::Stopped;
                    }
                    e += 1;
                    a = found_at + 1;
                }
                Resolution::ExpectedDropped { found_at } => {
                    debug!(
                        "ACTUAL line {} found at EXPECTED line {}, {} line(s) missing",
                        a + 1,
                        found_at + 1,
                        found_at - e
                    );
                    for absent in e..found_at {
                        let outcome =
                            LineOutcome::missing(absent + 1, a + 1, self.expected[absent]);
                        if self.record(report, outcome) {
                            return AlignStatus::Stopped;
                        }
                    }
                    let classification = classify_pair(self.expected[found_at], self.actual[a]);
                    if self.record(report, self.pair_outcome(found_at, a, &classification)) {
                        return AlignStatus::Stopped;
                    }
                    e = found_at + 1;
                    a += 1;
                }
            }
        }

        while a < self.actual.len() {
            if self.record(report, LineOutcome::added(e + 1, a + 1, self.actual[a])) {
                return AlignStatus::Stopped;
            }
            a += 1;
        }

        AlignStatus::Completed
    }

    fn resolve(&self, e: usize, a: usize) -> Resolution {
        let expected_row = self.expected[e];
        let actual_row = self.actual[a];

        if let Some(classification) = classify(expected_row, actual_row) {
            return Resolution::Pair(classification);
        }

        if let Some(found_at) = find_forward(self.actual, a + 1, expected_row) {
            return Resolution::ActualInserted { found_at };
        }
        if let Some(found_at) = find_forward(self.expected, e + 1, actual_row) {
            return Resolution::ExpectedDropped { found_at };
        }

        Resolution::Pair(classify_pair(expected_row, actual_row))
    }

    fn pair_outcome(&self, e: usize, a: usize, classification: &Classification) -> LineOutcome {
        match classification {
            Classification::Match => LineOutcome::matched(e + 1, a + 1, self.expected[e]),
            Classification::Mismatch(reason) => LineOutcome::mismatch(
                e + 1,
                a + 1,
                self.expected[e],
                self.actual[a],
                reason.note(),
            ),
        }
    }

    /// Append the outcome; true when the pass must stop here.
    fn record(&self, report: &mut ComparisonReport, outcome: LineOutcome) -> bool {
        let stop = self.stop_on_first_mismatch && outcome.kind() != LineKind::Matched;
        report.push_line(outcome);
        stop
    }
}

fn find_forward(lines: &[&str], from: usize, target: &str) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, line)| is_simple_match(target, line))
        .map(|(index, _)| index)
}
