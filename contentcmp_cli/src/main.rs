use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use contentcmp_common::{ensure_config, load_config, CompareError, CompareMode, Verdict};
use contentcmp_core::render::render;
use contentcmp_core::{
    CsvComparisonResult, Dataset, IdentityJoinComparator, ReportFormat, TextCompareEngine,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_ERROR: i32 = 1;
const EXIT_MISMATCH: i32 = 2;

#[derive(Parser)]
#[command(name = "contentcmp")]
#[command(author = "ContentCmp Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Line-by-line and identity-keyed content comparison", long_about = None)]
struct Cli {
    /// Read and write the config file next to the executable
    #[arg(long, global = true)]
    portable: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two text files line by line
    Text {
        /// EXPECTED file
        expected: PathBuf,

        /// ACTUAL file
        actual: PathBuf,

        /// fail-fast, thorough or diff (default from config)
        #[arg(short, long)]
        mode: Option<CompareMode>,

        /// text, json, html or csv
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,

        /// Also list lines that matched
        #[arg(short, long)]
        verbose: bool,

        /// Double-quote every CSV cell
        #[arg(long)]
        quote: bool,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two CSV files by identity columns
    Csv {
        /// EXPECTED file
        expected: PathBuf,

        /// ACTUAL file
        actual: PathBuf,

        /// Identity column(s) in EXPECTED (and ACTUAL unless --actual-identity is given)
        #[arg(short, long, required = true)]
        identity: Vec<String>,

        /// Identity column(s) in ACTUAL
        #[arg(long)]
        actual_identity: Vec<String>,

        /// Field mapping as EXPECTED=ACTUAL (repeatable)
        #[arg(short = 'M', long = "map")]
        mappings: Vec<String>,

        /// EXPECTED columns to show in each discrepancy
        #[arg(short, long)]
        display: Vec<String>,

        /// Identity value separator (default from config)
        #[arg(short, long)]
        separator: Option<String>,

        /// text, json or csv
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,

        /// Double-quote every CSV cell
        #[arg(long)]
        quote: bool,

        #[arg(long)]
        label_field: Option<String>,

        #[arg(long)]
        label_expected: Option<String>,

        #[arg(long)]
        label_actual: Option<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the config file location, creating it with defaults if absent
    Config,
}

struct TextArgs {
    expected: PathBuf,
    actual: PathBuf,
    mode: Option<CompareMode>,
    format: ReportFormat,
    verbose: bool,
    quote: bool,
    output: Option<PathBuf>,
}

struct CsvArgs {
    expected: PathBuf,
    actual: PathBuf,
    identity: Vec<String>,
    actual_identity: Vec<String>,
    mappings: Vec<String>,
    display: Vec<String>,
    separator: Option<String>,
    format: ReportFormat,
    quote: bool,
    labels: [Option<String>; 3],
    output: Option<PathBuf>,
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Text {
            expected,
            actual,
            mode,
            format,
            verbose,
            quote,
            output,
        } => run_text(
            cli.portable,
            TextArgs {
                expected,
                actual,
                mode,
                format,
                verbose,
                quote,
                output,
            },
        ),
        Commands::Csv {
            expected,
            actual,
            identity,
            actual_identity,
            mappings,
            display,
            separator,
            format,
            quote,
            label_field,
            label_expected,
            label_actual,
            output,
        } => run_csv(
            cli.portable,
            CsvArgs {
                expected,
                actual,
                identity,
                actual_identity,
                mappings,
                display,
                separator,
                format,
                quote,
                labels: [label_field, label_expected, label_actual],
                output,
            },
        ),
        Commands::Config => run_config(cli.portable).map(|_| Verdict::NotApplicable),
    };

    match result {
        Ok(Verdict::Fail) => std::process::exit(EXIT_MISMATCH),
        Ok(_) => {}
        Err(e) => {
            error!("Comparison failed: {:#}", e);
            std::process::exit(EXIT_ERROR);
        }
    }
}

fn run_text(portable: bool, args: TextArgs) -> anyhow::Result<Verdict> {
    let mut config = load_config(portable)?.config;
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    config.verbose |= args.verbose;
    config.quote_csv |= args.quote;

    let expected = read_content(&args.expected, "EXPECTED")?;
    let actual = read_content(&args.actual, "ACTUAL")?;

    info!("Comparing:");
    info!("  EXPECTED: {}", args.expected.display());
    info!("  ACTUAL:   {}", args.actual.display());

    let report = TextCompareEngine::from_config(&config).compare(&expected, &actual);

    let output = if config.mode == CompareMode::Diff {
        report.show_diffs()
    } else {
        render(&report, args.format, config.quote_csv)?
    };
    emit(&output, args.output.as_deref())?;

    Ok(report.verdict())
}

fn run_csv(portable: bool, args: CsvArgs) -> anyhow::Result<Verdict> {
    let mut config = load_config(portable)?.config;
    if let Some(separator) = args.separator {
        config.identity_separator = separator;
    }
    config.quote_csv |= args.quote;
    let [label_field, label_expected, label_actual] = args.labels;
    if let Some(label) = label_field {
        config.labels.mismatched_field = label;
    }
    if let Some(label) = label_expected {
        config.labels.expected = label;
    }
    if let Some(label) = label_actual {
        config.labels.actual = label;
    }

    let mapping = parse_mappings(&args.mappings)?;
    let actual_identity = if args.actual_identity.is_empty() {
        args.identity.clone()
    } else {
        args.actual_identity
    };

    let expected = read_dataset(&args.expected, "EXPECTED")?;
    let actual = read_dataset(&args.actual, "ACTUAL")?;

    let result = IdentityJoinComparator::new(args.identity, actual_identity)
        .with_config(&config)
        .with_mapping(mapping)
        .with_display_fields(args.display)
        .compare(&expected, &actual)?;

    let output = render_csv_result(&result, args.format, config.quote_csv)?;
    emit(&output, args.output.as_deref())?;

    Ok(if result.is_success() {
        Verdict::Pass
    } else {
        Verdict::Fail
    })
}

fn run_config(portable: bool) -> anyhow::Result<()> {
    let loaded = ensure_config(portable)?;
    println!("{}", loaded.path.display());
    Ok(())
}

fn render_csv_result(
    result: &CsvComparisonResult,
    format: ReportFormat,
    quote: bool,
) -> anyhow::Result<String> {
    Ok(match format {
        ReportFormat::Text => result.report_string().to_string(),
        ReportFormat::Json => result.to_json()?,
        ReportFormat::Csv => result.to_csv(quote)?,
        ReportFormat::Html => bail!("html output is only available for text comparisons"),
    })
}

fn parse_mappings(mappings: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    mappings
        .iter()
        .map(|mapping| {
            let parsed = mapping
                .split_once('=')
                .map(|(expected, actual)| (expected.trim(), actual.trim()));
            match parsed {
                Some((expected, actual)) if !expected.is_empty() && !actual.is_empty() => {
                    Ok((expected.to_string(), actual.to_string()))
                }
                _ => bail!("invalid field mapping '{}', expected EXPECTED=ACTUAL", mapping),
            }
        })
        .collect()
}

fn read_content(path: &Path, side: &str) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {}", side, path.display()))
}

fn read_dataset(path: &Path, side: &str) -> anyhow::Result<Dataset> {
    let csv_error = |e: csv::Error| CompareError::Csv(e.to_string());
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)
        .with_context(|| format!("Failed to open {} CSV file {}", side, path.display()))?;

    let headers = reader
        .headers()
        .map_err(csv_error)
        .with_context(|| format!("Failed to read {} CSV headers", side))?
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(csv_error)
            .with_context(|| format!("Failed to read {} CSV record", side))?;
        records.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(Dataset::new(headers, records))
}

fn emit(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}
