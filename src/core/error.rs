//! Error types for vcf-combine
//!
//! Defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vcf-combine operations
#[derive(Debug, Error)]
pub enum VcfCombineError {
    /// Configuration errors, raised before any output is opened
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors scoped to one input file
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Metadata line parsing errors
    #[error("Header parse error: {0}")]
    Header(#[from] HeaderParseError),

    /// Data line parsing errors
    #[error("Record parse error: {0}")]
    Record(#[from] RecordParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while parsing a `##INFO`/`##FORMAT` metadata line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderParseError {
    /// The line carries no quoted description
    #[error("Missing description in header line: {line}")]
    MissingDescription { line: String },

    /// The line is not of the form `##SECTION=<...>`
    #[error("Malformed header line ({message}): {line}")]
    Malformed { line: String, message: String },

    /// Section other than INFO or FORMAT
    #[error("Unsupported header section '{section}' in line: {line}")]
    UnsupportedSection { section: String, line: String },
}

/// Errors that can occur while parsing a data line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordParseError {
    #[error("Empty line")]
    EmptyLine,

    #[error("Too few fields: expected at least {expected}, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("Invalid number in field {0}: {1}")]
    InvalidNumber(&'static str, String),
}

/// Errors that abort the ingestion of one input file
#[derive(Debug, Error)]
pub enum SourceError {
    /// No `##source=` line before the column header
    #[error("Cannot identify caller from file {path}: add a caller identity line '##source=(caller name)' to the header")]
    MissingCaller { path: String },

    /// The file ended before the `#CHROM` line
    #[error("No column header line found in file {path}")]
    MissingColumnHeader { path: String },

    /// Paired sample columns could not be matched against the expected ids
    #[error("Normal or tumor sample id didn't match with file {path}: expected normal '{normal}' and tumor '{tumor}', found '{found_first}' and '{found_second}'")]
    SampleMismatch {
        path: String,
        normal: String,
        tumor: String,
        found_first: String,
        found_second: String,
    },

    /// A labelled sample column is absent from the column header
    #[error("Sample column '{label}' not found in file {path}")]
    MissingSampleColumn { path: String, label: String },

    /// Metadata line failed to parse
    #[error("In file {path}: {source}")]
    Header {
        path: String,
        #[source]
        source: HeaderParseError,
    },

    /// Data line failed to parse
    #[error("In file {path} at line {line}: {source}")]
    Record {
        path: String,
        line: usize,
        #[source]
        source: RecordParseError,
    },

    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in the run configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("There must be at least 1 VCF file")]
    NoInputs,

    #[error("Duplicate input file: {0}")]
    DuplicateInput(PathBuf),

    #[error("There were files that could not be found on disk ({missing}/{total}): {files}")]
    MissingInputs {
        missing: usize,
        total: usize,
        files: String,
    },

    #[error("No columns requested")]
    NoColumns,

    #[error("The number of vcfs ({inputs}) does not match with the number of callers in priority ({priority})")]
    PriorityCountMismatch { inputs: usize, priority: usize },

    #[error("The priority '{priority}' does not match the callers list '{callers}' from the vcfs")]
    PriorityMismatch { priority: String, callers: String },

    #[error("Normal and tumor sample ids are required for paired (somatic) vcfs")]
    MissingSampleIds,

    #[error("Missing pileup input: {0}")]
    MissingPileup(&'static str),
}

/// Result type alias for vcf-combine operations
pub type Result<T> = std::result::Result<T, VcfCombineError>;

/// Result type alias for metadata line parsing
pub type HeaderResult<T> = std::result::Result<T, HeaderParseError>;

/// Result type alias for data line parsing
pub type RecordResult<T> = std::result::Result<T, RecordParseError>;

/// Result type alias for per-file ingestion
pub type SourceResult<T> = std::result::Result<T, SourceError>;
