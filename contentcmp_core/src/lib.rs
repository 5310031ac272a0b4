pub mod aligner;
pub mod classify;
pub mod precheck;
pub mod render;
pub mod report;
pub mod tabular;
pub mod text_compare;

pub use aligner::{AlignStatus, LineAligner};
pub use classify::{
    classify, classify_pair, edit_distance, Classification, EditDistance, MismatchReason,
};
pub use precheck::{precheck, split_lines, Precheck};
pub use render::{render, ReportFormat};
pub use report::{format_percent, ComparisonReport};
pub use tabular::{CsvComparisonResult, Dataset, IdentityJoinComparator};
pub use text_compare::TextCompareEngine;
