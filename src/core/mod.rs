//! Core building blocks
//!
//! Error types, buffered I/O, run configuration, numeric statistics and
//! caller-specific behaviour shared by the format adapters and the merge.

pub mod caller;
pub mod config;
mod error;
pub mod io;
pub mod stats;

pub use caller::CallerKind;
pub use config::{AnnotateConfig, CombineConfig, PileupInputs, SampleLayout, DEFAULT_SUMMARY_PATH};
pub use error::{
    ConfigError, HeaderParseError, HeaderResult, RecordParseError, RecordResult, Result,
    SourceError, SourceResult, VcfCombineError,
};
pub use io::{create_output, detect_compression, open_input, CompressionFormat, LineIterator, DEFAULT_BUFFER_SIZE};
