//! Identity-keyed comparison of two tabular datasets.
//!
//! Each record gets a composite identity key built from its identity columns.
//! Both sides are sorted by that key (ordinal string order) and merge-joined:
//! equal keys compare every mapped field, a key present on one side only is
//! reported as a record missing from the other side.

use crate::render::{csv_writer, finish_csv};
use crate::report::format_percent;
use contentcmp_common::{
    default_identity_separator, ColumnLabels, CompareConfig, CompareError, FileOutcome, Side,
};
use serde::Serialize;
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

pub const MISSING_IN_EXPECTED: &str = "RECORD MISSING IN EXPECTED";
pub const MISSING_IN_ACTUAL: &str = "RECORD MISSING IN ACTUAL";

/// A parsed table: header names plus records positionally aligned to them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self { headers, records }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

/// Sort-merge join comparator keyed on identity columns
#[derive(Debug, Clone)]
pub struct IdentityJoinComparator {
    expected_identity: Vec<String>,
    actual_identity: Vec<String>,
    field_mapping: Vec<(String, String)>,
    display_fields: Vec<String>,
    separator: String,
    labels: ColumnLabels,
}

/// Mapped field resolved to column positions
struct FieldPair<'a> {
    name: &'a str,
    expected_index: usize,
    actual_index: usize,
}

impl IdentityJoinComparator {
    pub fn new(expected_identity: Vec<String>, actual_identity: Vec<String>) -> Self {
        Self {
            expected_identity,
            actual_identity,
            field_mapping: Vec::new(),
            display_fields: Vec::new(),
            separator: default_identity_separator(),
            labels: ColumnLabels::default(),
        }
    }

    /// Same identity column names on both sides
    pub fn with_identity(identity: Vec<String>) -> Self {
        Self::new(identity.clone(), identity)
    }

    /// Take separator and column labels from the config. An empty separator
    /// falls back to the default.
    pub fn with_config(mut self, config: &CompareConfig) -> Self {
        if config.identity_separator.is_empty() {
            warn!(
                "Empty identity separator in config, using '{}'",
                default_identity_separator()
            );
            self.separator = default_identity_separator();
        } else {
            self.separator = config.identity_separator.clone();
        }
        self.labels = config.labels.clone();
        self
    }

    /// Map an EXPECTED field to an ACTUAL field. Without any mapping every
    /// EXPECTED header is compared against the ACTUAL header of the same name.
    pub fn map_field(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.field_mapping.push((expected.into(), actual.into()));
        self
    }

    pub fn with_mapping(mut self, mapping: Vec<(String, String)>) -> Self {
        self.field_mapping = mapping;
        self
    }

    /// EXPECTED columns surfaced in each discrepancy row. Defaults to the
    /// EXPECTED identity columns.
    pub fn with_display_fields(mut self, fields: Vec<String>) -> Self {
        self.display_fields = fields;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_labels(mut self, labels: ColumnLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn compare(
        &self,
        expected: &Dataset,
        actual: &Dataset,
    ) -> Result<CsvComparisonResult, CompareError> {
        let display_fields = if self.display_fields.is_empty() {
            self.expected_identity.clone()
        } else {
            self.display_fields.clone()
        };
        let mut result = CsvComparisonResult {
            expected_headers: expected.headers.clone(),
            actual_headers: actual.headers.clone(),
            identity_fields: self.expected_identity.clone(),
            display_fields,
            labels: self.labels.clone(),
            file_outcomes: Vec::new(),
            discrepancies: Vec::new(),
            failed_identities: BTreeSet::new(),
            expected_row_count: expected.records.len(),
            actual_row_count: actual.records.len(),
            rendered: OnceCell::new(),
        };

        if expected.records.is_empty() && actual.records.is_empty() {
            info!("Both datasets are empty, nothing to join");
            result.file_outcomes.push(FileOutcome::content_empty(true, true));
            return Ok(result);
        }

        let expected_keys =
            self.identity_indices(expected, &self.expected_identity, Side::Expected)?;
        let actual_keys = self.identity_indices(actual, &self.actual_identity, Side::Actual)?;
        let fields = self.resolve_mapping(expected, actual)?;
        let display_expected = result
            .display_fields
            .iter()
            .map(|field| {
                expected.column(field).ok_or_else(|| CompareError::MissingColumn {
                    side: Side::Expected,
                    column: field.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let display_actual: Vec<Option<usize>> = result
            .display_fields
            .iter()
            .map(|field| actual.column(self.actual_name_for(field)))
            .collect();

        if expected.records.is_empty() || actual.records.is_empty() {
            result.file_outcomes.push(FileOutcome::content_empty(
                expected.records.is_empty(),
                actual.records.is_empty(),
            ));
        }

        info!(
            "Joining {} EXPECTED record(s) with {} ACTUAL record(s) on {} mapped field(s)",
            expected.records.len(),
            actual.records.len(),
            fields.len()
        );

        let expected_sorted = self.keyed(expected, &expected_keys);
        let actual_sorted = self.keyed(actual, &actual_keys);

        let (mut i, mut j) = (0usize, 0usize);
        loop {
            let ordering = match (expected_sorted.get(i), actual_sorted.get(j)) {
                (Some((expected_key, _)), Some((actual_key, _))) => expected_key.cmp(actual_key),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };

            match ordering {
                Ordering::Equal => {
                    let (key, expected_record) = &expected_sorted[i];
                    let (_, actual_record) = &actual_sorted[j];
                    for field in &fields {
                        let expected_value = cell(expected_record, Some(field.expected_index));
                        let actual_value = cell(actual_record, Some(field.actual_index));
                        if expected_value != actual_value {
                            let mut row = display_values(
                                expected_record,
                                display_expected.iter().copied().map(Some),
                            );
                            row.extend([
                                field.name.to_string(),
                                expected_value.to_string(),
                                actual_value.to_string(),
                            ]);
                            result.push_discrepancy(key, row);
                        }
                    }
                    i += 1;
                    j += 1;
                }
                Ordering::Greater => {
                    let (key, actual_record) = &actual_sorted[j];
                    debug!("Identity '{}' missing in EXPECTED", key);
                    let mut row = display_values(actual_record, display_actual.iter().copied());
                    row.extend([MISSING_IN_EXPECTED.to_string(), String::new(), key.clone()]);
                    result.push_discrepancy(key, row);
                    j += 1;
                }
                Ordering::Less => {
                    let (key, expected_record) = &expected_sorted[i];
                    debug!("Identity '{}' missing in ACTUAL", key);
                    let mut row = display_values(
                        expected_record,
                        display_expected.iter().copied().map(Some),
                    );
                    row.extend([MISSING_IN_ACTUAL.to_string(), key.clone(), String::new()]);
                    result.push_discrepancy(key, row);
                    i += 1;
                }
            }
        }

        info!(
            "Join finished: {} discrepancy row(s), {} failed identities, success rate {}",
            result.discrepancies.len(),
            result.failed_identities.len(),
            format_percent(result.success_rate())
        );
        Ok(result)
    }

    fn identity_indices(
        &self,
        dataset: &Dataset,
        identity: &[String],
        side: Side,
    ) -> Result<Vec<usize>, CompareError> {
        if dataset.headers.is_empty() {
            return Err(CompareError::BlankContent { side });
        }
        if identity.is_empty() {
            return Err(CompareError::MissingIdentity { side });
        }
        identity
            .iter()
            .map(|column| {
                dataset.column(column).ok_or_else(|| CompareError::MissingColumn {
                    side,
                    column: column.clone(),
                })
            })
            .collect()
    }

    fn resolve_mapping<'a>(
        &'a self,
        expected: &'a Dataset,
        actual: &Dataset,
    ) -> Result<Vec<FieldPair<'a>>, CompareError> {
        let pairs: Vec<(&str, &str)> = if self.field_mapping.is_empty() {
            expected
                .headers
                .iter()
                .map(|header| (header.as_str(), header.as_str()))
                .collect()
        } else {
            self.field_mapping
                .iter()
                .map(|(left, right)| (left.as_str(), right.as_str()))
                .collect()
        };

        pairs
            .into_iter()
            .map(|(expected_name, actual_name)| -> Result<FieldPair<'a>, CompareError> {
                let expected_index =
                    expected.column(expected_name).ok_or_else(|| CompareError::UnmappedField {
                        side: Side::Expected,
                        field: expected_name.to_string(),
                    })?;
                let actual_index =
                    actual.column(actual_name).ok_or_else(|| CompareError::UnmappedField {
                        side: Side::Actual,
                        field: actual_name.to_string(),
                    })?;
                Ok(FieldPair {
                    name: expected_name,
                    expected_index,
                    actual_index,
                })
            })
            .collect()
    }

    /// ACTUAL column name holding an EXPECTED field's value: the mapped name,
    /// else the paired identity column, else the same name.
    fn actual_name_for<'a>(&'a self, expected_field: &'a str) -> &'a str {
        if let Some((_, actual)) = self
            .field_mapping
            .iter()
            .find(|(left, _)| left == expected_field)
        {
            return actual;
        }
        self.expected_identity
            .iter()
            .position(|column| column == expected_field)
            .and_then(|index| self.actual_identity.get(index))
            .map(String::as_str)
            .unwrap_or(expected_field)
    }

    fn keyed<'d>(
        &self,
        dataset: &'d Dataset,
        key_indices: &[usize],
    ) -> Vec<(String, &'d Vec<String>)> {
        let mut keyed: Vec<(String, &Vec<String>)> = dataset
            .records
            .iter()
            .map(|record| {
                let key = key_indices
                    .iter()
                    .map(|&index| cell(record, Some(index)))
                    .collect::<Vec<_>>()
                    .join(self.separator.as_str());
                (key, record)
            })
            .collect();
        keyed.sort_by(|left, right| left.0.cmp(&right.0));
        keyed
    }
}

fn cell(record: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|index| record.get(index))
        .map(String::as_str)
        .unwrap_or("")
}

fn display_values(record: &[String], indices: impl Iterator<Item = Option<usize>>) -> Vec<String> {
    indices.map(|index| cell(record, index).to_string()).collect()
}

/// Outcome of an identity join
#[derive(Debug, Clone, Serialize)]
pub struct CsvComparisonResult {
    expected_headers: Vec<String>,
    actual_headers: Vec<String>,
    identity_fields: Vec<String>,
    display_fields: Vec<String>,
    labels: ColumnLabels,
    file_outcomes: Vec<FileOutcome>,
    discrepancies: Vec<Vec<String>>,
    failed_identities: BTreeSet<String>,
    expected_row_count: usize,
    actual_row_count: usize,
    #[serde(skip)]
    rendered: OnceCell<String>,
}

impl CsvComparisonResult {
    fn push_discrepancy(&mut self, identity: &str, row: Vec<String>) {
        self.failed_identities.insert(identity.to_string());
        self.discrepancies.push(row);
    }

    pub fn expected_headers(&self) -> &[String] {
        &self.expected_headers
    }

    pub fn actual_headers(&self) -> &[String] {
        &self.actual_headers
    }

    pub fn identity_fields(&self) -> &[String] {
        &self.identity_fields
    }

    pub fn display_fields(&self) -> &[String] {
        &self.display_fields
    }

    pub fn file_outcomes(&self) -> &[FileOutcome] {
        &self.file_outcomes
    }

    /// Display values followed by field, expected value and actual value
    pub fn discrepancies(&self) -> &[Vec<String>] {
        &self.discrepancies
    }

    pub fn failed_identities(&self) -> &BTreeSet<String> {
        &self.failed_identities
    }

    pub fn expected_row_count(&self) -> usize {
        self.expected_row_count
    }

    pub fn actual_row_count(&self) -> usize {
        self.actual_row_count
    }

    pub fn success_rate(&self) -> f64 {
        if self.failed_identities.is_empty() {
            return 1.0;
        }
        if self.actual_row_count == 0 || self.expected_row_count == 0 {
            return 0.0;
        }
        let passed = self
            .expected_row_count
            .saturating_sub(self.failed_identities.len());
        passed as f64 / self.expected_row_count as f64
    }

    pub fn is_success(&self) -> bool {
        self.failed_identities.is_empty()
            && !self.file_outcomes.iter().any(|outcome| outcome.discrepancy)
    }

    pub fn header_row(&self) -> Vec<String> {
        let mut header = self.display_fields.clone();
        header.extend([
            self.labels.mismatched_field.clone(),
            self.labels.expected.clone(),
            self.labels.actual.clone(),
        ]);
        header
    }

    /// Aligned plain-text table of the discrepancies plus a summary line.
    /// Built on first use and cached.
    pub fn report_string(&self) -> &str {
        self.rendered.get_or_init(|| self.render_plain())
    }

    fn render_plain(&self) -> String {
        let header = self.header_row();
        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &self.discrepancies {
            for (width, value) in widths.iter_mut().zip(row) {
                *width = (*width).max(value.chars().count());
            }
        }

        let format_row = |row: &[String]| {
            row.iter()
                .zip(&widths)
                .map(|(value, width)| format!("{:<width$}", value, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = Vec::new();
        for outcome in &self.file_outcomes {
            out.push(format!(
                "{}: EXPECTED {} / ACTUAL {}",
                outcome.message, outcome.expected, outcome.actual
            ));
        }
        out.push(format_row(&header));
        out.push("-".repeat(out.last().map(|line| line.chars().count()).unwrap_or(0)));
        for row in &self.discrepancies {
            out.push(format_row(row));
        }
        out.push(format!(
            "EXPECTED rows: {}, ACTUAL rows: {}, failed identities: {}, success rate: {}",
            self.expected_row_count,
            self.actual_row_count,
            self.failed_identities.len(),
            format_percent(self.success_rate())
        ));

        let mut text = out.join("\n");
        text.push('\n');
        text
    }

    /// Header row plus one row per discrepancy
    pub fn to_csv(&self, quote: bool) -> Result<String, CompareError> {
        let mut writer = csv_writer(quote);
        let map_err = |e: csv::Error| CompareError::Serialization(e.to_string());
        writer.write_record(self.header_row()).map_err(map_err)?;
        for row in &self.discrepancies {
            writer.write_record(row).map_err(map_err)?;
        }
        finish_csv(writer)
    }

    pub fn to_json(&self) -> Result<String, CompareError> {
        #[derive(Serialize)]
        struct JsonCsvReport<'a> {
            #[serde(flatten)]
            result: &'a CsvComparisonResult,
            success_rate: f64,
        }

        serde_json::to_string_pretty(&JsonCsvReport {
            result: self,
            success_rate: self.success_rate(),
        })
        .map_err(|e| CompareError::Serialization(e.to_string()))
    }
}
