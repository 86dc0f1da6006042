//! Run configuration
//!
//! Plain structs built by the command line front end and validated
//! before any output file is opened.

use super::error::ConfigError;
use std::collections::HashSet;
use std::path::PathBuf;

/// Default path of the combination-count report
pub const DEFAULT_SUMMARY_PATH: &str = "Combine_variants_summary.tsv";

/// Sample column layout of the inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleLayout {
    /// One sample column (germline or tumour-only calls)
    Single,
    /// Two sample columns, matched against these ids
    Paired { normal_id: String, tumor_id: String },
}

impl SampleLayout {
    pub fn is_paired(&self) -> bool {
        matches!(self, SampleLayout::Paired { .. })
    }

    /// Build from a mode flag and optional sample ids
    pub fn from_parts(
        paired: bool,
        normal_id: Option<String>,
        tumor_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        if !paired {
            return Ok(SampleLayout::Single);
        }
        match (normal_id, tumor_id) {
            (Some(normal_id), Some(tumor_id)) if !normal_id.is_empty() && !tumor_id.is_empty() => {
                Ok(SampleLayout::Paired { normal_id, tumor_id })
            }
            _ => Err(ConfigError::MissingSampleIds),
        }
    }
}

/// Configuration of one merge run
#[derive(Debug, Clone)]
pub struct CombineConfig {
    /// Input VCF files
    pub inputs: Vec<PathBuf>,
    /// Requested INFO/FORMAT identifiers, in output order
    pub columns: Vec<String>,
    /// Merged VCF output
    pub output: PathBuf,
    pub layout: SampleLayout,
    /// Caller priority; lexicographic order when absent
    pub priority: Option<Vec<String>>,
    /// Optional `chrom\tpos` list of merged variants
    pub regions: Option<PathBuf>,
    /// Combination-count report
    pub summary: PathBuf,
}

impl CombineConfig {
    pub fn new(inputs: Vec<PathBuf>, columns: Vec<String>, output: PathBuf, layout: SampleLayout) -> Self {
        Self {
            inputs,
            columns,
            output,
            layout,
            priority: None,
            regions: None,
            summary: PathBuf::from(DEFAULT_SUMMARY_PATH),
        }
    }

    /// Check the configuration; nothing is written before this passes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inputs.is_empty() {
            return Err(ConfigError::NoInputs);
        }

        let mut seen = HashSet::new();
        for input in &self.inputs {
            if !seen.insert(input) {
                return Err(ConfigError::DuplicateInput(input.clone()));
            }
        }

        let missing: Vec<String> = self
            .inputs
            .iter()
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingInputs {
                missing: missing.len(),
                total: self.inputs.len(),
                files: missing.join(", "),
            });
        }

        if self.columns.iter().all(|c| c.is_empty()) {
            return Err(ConfigError::NoColumns);
        }

        if let Some(priority) = &self.priority {
            if priority.len() != self.inputs.len() {
                return Err(ConfigError::PriorityCountMismatch {
                    inputs: self.inputs.len(),
                    priority: priority.len(),
                });
            }
        }

        Ok(())
    }
}

/// Pileup inputs for the read-support annotator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PileupInputs {
    Single(PathBuf),
    Paired { normal: PathBuf, tumor: PathBuf },
}

/// Configuration of one annotation run
#[derive(Debug, Clone)]
pub struct AnnotateConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub layout: SampleLayout,
    pub pileups: PileupInputs,
}

impl AnnotateConfig {
    /// Pair the layout with the matching pileup inputs
    pub fn new(
        input: PathBuf,
        output: PathBuf,
        layout: SampleLayout,
        pileup: Option<PathBuf>,
        normal_pileup: Option<PathBuf>,
        tumor_pileup: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let pileups = match &layout {
            SampleLayout::Single => PileupInputs::Single(pileup.ok_or(ConfigError::MissingPileup("pileup"))?),
            SampleLayout::Paired { .. } => PileupInputs::Paired {
                normal: normal_pileup.ok_or(ConfigError::MissingPileup("normal pileup"))?,
                tumor: tumor_pileup.ok_or(ConfigError::MissingPileup("tumor pileup"))?,
            },
        };
        Ok(Self { input, output, layout, pileups })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut paths = vec![&self.input];
        match &self.pileups {
            PileupInputs::Single(p) => paths.push(p),
            PileupInputs::Paired { normal, tumor } => {
                paths.push(normal);
                paths.push(tumor);
            }
        }
        let missing: Vec<String> = paths
            .iter()
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingInputs {
                missing: missing.len(),
                total: paths.len(),
                files: missing.join(", "),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_layout_requires_both_ids() {
        assert_eq!(SampleLayout::from_parts(false, None, None), Ok(SampleLayout::Single));
        assert_eq!(
            SampleLayout::from_parts(true, Some("N".into()), None),
            Err(ConfigError::MissingSampleIds)
        );
        assert!(SampleLayout::from_parts(true, Some("N".into()), Some("T".into()))
            .unwrap()
            .is_paired());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let file = NamedTempFile::new().unwrap();
        let config = CombineConfig::new(
            vec![file.path().to_path_buf(), file.path().to_path_buf()],
            vec!["DP".into()],
            PathBuf::from("out.vcf"),
            SampleLayout::Single,
        );
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateInput(_))));
    }

    #[test]
    fn test_validate_rejects_missing_files() {
        let config = CombineConfig::new(
            vec![PathBuf::from("/definitely/not/here.vcf")],
            vec!["DP".into()],
            PathBuf::from("out.vcf"),
            SampleLayout::Single,
        );
        assert!(matches!(config.validate(), Err(ConfigError::MissingInputs { missing: 1, total: 1, .. })));
    }

    #[test]
    fn test_validate_priority_count() {
        let a = NamedTempFile::new().unwrap();
        let b = NamedTempFile::new().unwrap();
        let mut config = CombineConfig::new(
            vec![a.path().to_path_buf(), b.path().to_path_buf()],
            vec!["DP".into()],
            PathBuf::from("out.vcf"),
            SampleLayout::Single,
        );
        config.priority = Some(vec!["gatk".into()]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::PriorityCountMismatch { inputs: 2, priority: 1 })
        );
        config.priority = Some(vec!["gatk".into(), "strelka".into()]);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_annotate_config_needs_pileups() {
        let layout = SampleLayout::Paired { normal_id: "N".into(), tumor_id: "T".into() };
        let err = AnnotateConfig::new("in.vcf".into(), "out.vcf".into(), layout, None, Some("n".into()), None);
        assert_eq!(err.unwrap_err(), ConfigError::MissingPileup("tumor pileup"));
    }
}
