//! vcf-combine - Normalise and merge VCF files from several variant callers
//!
//! Each input VCF is reduced to a requested set of INFO/FORMAT fields,
//! attributed to its caller, and merged by genomic identity. The merged
//! file carries every caller's values plus cross-caller depth statistics.
//!
//! # Features
//!
//! - Single-sample (germline) and paired normal/tumor (somatic) inputs
//! - Caller-specific handling for strelka and vardict output
//! - Combination-count report of caller overlaps
//! - Read-support annotation from samtools mpileup output
//! - Transparent gzip/bzip2 input
//!
//! # Example
//!
//! ```ignore
//! use vcf_combine::{run_combine, CombineConfig, SampleLayout};
//!
//! let config = CombineConfig::new(
//!     vec!["gatk.vcf".into(), "strelka.vcf".into()],
//!     vec!["GT".into(), "AD".into(), "DP".into()],
//!     "merged.vcf".into(),
//!     SampleLayout::Single,
//! );
//! let summary = run_combine(&config)?;
//! println!("{} merged variants", summary.merged);
//! ```

pub mod core;
pub mod formats;
pub mod merge;

pub use crate::core::{
    AnnotateConfig, CallerKind, CombineConfig, ConfigError, PileupInputs, Result, SampleLayout,
    SourceError, VcfCombineError,
};
pub use crate::formats::{
    run_annotate, AnnotateSummary, HeaderField, ReadSupport, SourceFile, VariantKey, VariantRecord,
};
pub use crate::merge::{run_combine, MergeEngine, MergeSummary};
