use chrono::{DateTime, Local};
use contentcmp_common::{CompareMode, FileOutcome, LineKind, LineOutcome, Verdict};

/// Accumulates the outcomes of one comparison.
///
/// Line counters are updated only through [`ComparisonReport::push_line`], so
/// they always agree with the recorded outcomes. File-level outcomes never
/// touch the counters.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    mode: CompareMode,
    verbose: bool,
    created_at: DateTime<Local>,
    file_outcomes: Vec<FileOutcome>,
    line_outcomes: Vec<LineOutcome>,
    match_count: usize,
    mismatch_count: usize,
}

impl ComparisonReport {
    pub fn new(mode: CompareMode) -> Self {
        Self {
            mode,
            verbose: false,
            created_at: Local::now(),
            file_outcomes: Vec::new(),
            line_outcomes: Vec::new(),
            match_count: 0,
            mismatch_count: 0,
        }
    }

    /// Include MATCHED lines in listings
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn push_file_outcome(&mut self, outcome: FileOutcome) {
        self.file_outcomes.push(outcome);
    }

    pub fn push_line(&mut self, outcome: LineOutcome) {
        if outcome.kind() == LineKind::Matched {
            self.match_count += 1;
        } else {
            self.mismatch_count += 1;
        }
        self.line_outcomes.push(outcome);
    }

    pub fn mode(&self) -> CompareMode {
        self.mode
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn file_outcomes(&self) -> &[FileOutcome] {
        &self.file_outcomes
    }

    pub fn line_outcomes(&self) -> &[LineOutcome] {
        &self.line_outcomes
    }

    /// Line outcomes shown in listings: everything but MATCHED unless verbose
    pub fn visible_lines(&self) -> impl Iterator<Item = &LineOutcome> {
        let verbose = self.verbose;
        self.line_outcomes
            .iter()
            .filter(move |line| verbose || line.kind() != LineKind::Matched)
    }

    pub fn match_count(&self) -> usize {
        self.match_count
    }

    pub fn mismatch_count(&self) -> usize {
        self.mismatch_count
    }

    pub fn match_percent(&self) -> f64 {
        if self.mismatch_count == 0 {
            return 1.0;
        }
        self.match_count as f64 / (self.match_count + self.mismatch_count) as f64
    }

    pub fn mismatch_percent(&self) -> f64 {
        if self.mismatch_count == 0 {
            return 0.0;
        }
        self.mismatch_count as f64 / (self.match_count + self.mismatch_count) as f64
    }

    pub fn has_line_mismatch(&self) -> bool {
        self.mismatch_count > 0
    }

    pub fn has_file_discrepancy(&self) -> bool {
        self.file_outcomes.iter().any(|outcome| outcome.discrepancy)
    }

    pub fn verdict(&self) -> Verdict {
        if self.mode == CompareMode::Diff {
            Verdict::NotApplicable
        } else if self.has_line_mismatch() || self.has_file_discrepancy() {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    pub fn statistics(&self) -> String {
        format!(
            "matched: {}, mismatched: {}, match: {}, mismatch: {}",
            self.match_count,
            self.mismatch_count,
            format_percent(self.match_percent()),
            format_percent(self.mismatch_percent())
        )
    }

    /// Condensed per-line transcript.
    pub fn show_diffs(&self) -> String {
        let mut out = String::new();

        for outcome in &self.file_outcomes {
            out.push_str(&format!(
                "----- {}: EXPECTED {} / ACTUAL {}\n",
                outcome.message, outcome.expected, outcome.actual
            ));
        }

        for line in &self.line_outcomes {
            let text = match line.kind() {
                LineKind::Added => format!("{} (missing in EXPECTED)", line.actual_text()),
                _ => line.expected_text().to_string(),
            };
            out.push_str(&format!(
                "{:>5} {:<8} {}",
                line.expected_line(),
                line.kind().label(),
                text
            ));
            if line.is_realigned() {
                out.push_str(&format!(" [found at ACTUAL line {}]", line.actual_line()));
            }
            out.push('\n');
        }

        out
    }
}

/// Render a ratio as a percentage with two fractional digits
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentcmp_common::FileOutcome;

    #[test]
    fn test_counters_follow_appended_lines() {
        let mut report = ComparisonReport::new(CompareMode::Thorough);
        report.push_line(LineOutcome::matched(1, 1, "a"));
        report.push_line(LineOutcome::mismatch(2, 2, "b", "B", "mismatch due to letter case"));
        report.push_line(LineOutcome::missing(3, 3, "c"));
        report.push_line(LineOutcome::added(4, 3, "d"));
        report.push_file_outcome(FileOutcome::size_differs(5, 7));

        assert_eq!(report.match_count(), 1);
        assert_eq!(report.mismatch_count(), 3);
        assert_eq!(report.line_outcomes().len(), 4);
        assert_eq!(report.file_outcomes().len(), 1);
        assert_eq!(report.verdict(), Verdict::Fail);
    }

    #[test]
    fn test_percentages() {
        let mut report = ComparisonReport::new(CompareMode::Thorough);
        assert_eq!(report.match_percent(), 1.0);
        assert_eq!(report.mismatch_percent(), 0.0);

        for i in 1..=5 {
            report.push_line(LineOutcome::matched(i, i, "same"));
        }
        report.push_line(LineOutcome::missing(6, 6, "gone"));
        assert_eq!(format_percent(report.match_percent()), "83.33%");
        assert_eq!(format_percent(report.mismatch_percent()), "16.67%");
        assert!(report.statistics().contains("match: 83.33%"));
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.8333), "83.33%");
        assert_eq!(format_percent(1.0), "100.00%");
        assert_eq!(format_percent(0.0), "0.00%");
    }

    #[test]
    fn test_diff_mode_has_no_verdict() {
        let mut report = ComparisonReport::new(CompareMode::Diff);
        report.push_line(LineOutcome::missing(1, 1, "x"));
        assert_eq!(report.verdict(), Verdict::NotApplicable);
    }

    #[test]
    fn test_blank_pair_passes() {
        let mut report = ComparisonReport::new(CompareMode::Thorough);
        report.push_file_outcome(FileOutcome::content_empty(true, true));
        assert_eq!(report.verdict(), Verdict::Pass);
    }

    #[test]
    fn test_visible_lines_hide_matches_unless_verbose() {
        let mut report = ComparisonReport::new(CompareMode::Thorough);
        report.push_line(LineOutcome::matched(1, 1, "a"));
        report.push_line(LineOutcome::missing(2, 2, "b"));
        assert_eq!(report.visible_lines().count(), 1);

        let report = report.with_verbose(true);
        assert_eq!(report.visible_lines().count(), 2);
    }

    #[test]
    fn test_show_diffs() {
        let mut report = ComparisonReport::new(CompareMode::Diff);
        report.push_line(LineOutcome::matched(1, 1, "x"));
        report.push_line(LineOutcome::missing(2, 2, "y"));
        report.push_line(LineOutcome::matched(3, 2, "z"));
        report.push_line(LineOutcome::added(4, 3, "extra"));

        let transcript = report.show_diffs();
        let lines: Vec<&str> = transcript.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "    1 MATCHED  x");
        assert_eq!(lines[1], "    2 MISSING  y");
        assert_eq!(lines[2], "    3 MATCHED  z [found at ACTUAL line 2]");
        assert_eq!(lines[3], "    4 ADDED    extra (missing in EXPECTED)");
    }
}
