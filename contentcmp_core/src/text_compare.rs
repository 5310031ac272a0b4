use crate::aligner::{AlignStatus, LineAligner};
use crate::precheck::{is_blank, precheck, split_lines, Precheck};
use crate::report::ComparisonReport;
use contentcmp_common::{CompareConfig, CompareMode, FileOutcome, LineOutcome};
use tracing::{debug, info};

/// Line-oriented comparison of two resolved text bodies
#[derive(Debug, Clone, Default)]
pub struct TextCompareEngine {
    mode: CompareMode,
    verbose: bool,
}

impl TextCompareEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CompareConfig) -> Self {
        Self {
            mode: config.mode,
            verbose: config.verbose,
        }
    }

    pub fn with_mode(mut self, mode: CompareMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn mode(&self) -> CompareMode {
        self.mode
    }

    /// Compare EXPECTED against ACTUAL. Each call builds its own report and
    /// never mutates the inputs.
    pub fn compare(&self, expected: &str, actual: &str) -> ComparisonReport {
        let mut report = ComparisonReport::new(self.mode).with_verbose(self.verbose);

        let expected_blank = is_blank(expected);
        let actual_blank = is_blank(actual);
        if expected_blank || actual_blank {
            info!("Blank content (EXPECTED: {}, ACTUAL: {})", expected_blank, actual_blank);
            report.push_file_outcome(FileOutcome::content_empty(expected_blank, actual_blank));
            return report;
        }

        let expected_lines = split_lines(expected);
        let actual_lines = split_lines(actual);
        info!(
            "Comparing {} EXPECTED line(s) with {} ACTUAL line(s) ({} mode)",
            expected_lines.len(),
            actual_lines.len(),
            self.mode
        );

        match precheck(
            expected,
            actual,
            expected_lines.len(),
            actual_lines.len(),
            &mut report,
        ) {
            Precheck::CertainMatch => {
                for (index, line) in expected_lines.iter().enumerate() {
                    report.push_line(LineOutcome::matched(index + 1, index + 1, line));
                }
            }
            Precheck::Inconclusive => {
                let status = LineAligner::new(&expected_lines, &actual_lines)
                    .stop_on_first_mismatch(self.mode.stops_early())
                    .run(&mut report);
                if status == AlignStatus::Stopped {
                    debug!(
                        "Stopped after {} line outcome(s) at first mismatch",
                        report.line_outcomes().len()
                    );
                }
            }
        }

        info!("Comparison finished: {}", report.statistics());
        report
    }

    /// Run a full pass and return only the condensed transcript.
    pub fn diff(&self, expected: &str, actual: &str) -> String {
        self.clone()
            .with_mode(CompareMode::Diff)
            .compare(expected, actual)
            .show_diffs()
    }
}
