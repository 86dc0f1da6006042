//! Caller-specific behaviour
//!
//! Most callers are handled uniformly. Two need special treatment:
//!
//! - `strelka` reports indel depth in `DPI`, never reports allele
//!   frequency, labels paired sample columns `NORMAL`/`TUMOR` and
//!   carries no `GT` in its paired output. Its paired output has no
//!   `AD` either; allele depths come from the per-base `AU`/`CU`/`GU`/`TU`
//!   tiers for SNVs and `TAR`/`TIR` for indels.
//! - `vardict` reports germline calls alongside somatic ones in paired
//!   output (`STATUS=Germline`).

/// Caller identity line prefix
pub const SOURCE_PREFIX: &str = "##source=";

pub const STRELKA: &str = "strelka";
pub const VARDICT: &str = "vardict";

/// Known caller families with special handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerKind {
    Strelka,
    Vardict,
    Other,
}

impl CallerKind {
    /// Classify a caller name taken from the identity line
    pub fn of(name: &str) -> Self {
        match name {
            STRELKA => CallerKind::Strelka,
            VARDICT => CallerKind::Vardict,
            _ => CallerKind::Other,
        }
    }

    /// Indel records carry depth in `DPI` instead of `DP`
    pub fn reports_indel_depth_separately(self) -> bool {
        self == CallerKind::Strelka
    }

    /// No allele-frequency descriptor in single-sample output
    pub fn lacks_allele_frequency(self) -> bool {
        self == CallerKind::Strelka
    }

    /// Paired output carries no genotype field
    pub fn lacks_paired_genotype(self) -> bool {
        self == CallerKind::Strelka
    }

    /// Paired `AD`/`AF` must be derived from tiered read counts
    pub fn derives_paired_allele_depth(self) -> bool {
        self == CallerKind::Strelka
    }

    /// Paired sample columns use fixed labels rather than sample ids
    pub fn fixed_sample_labels(self) -> Option<(&'static str, &'static str)> {
        match self {
            CallerKind::Strelka => Some(("NORMAL", "TUMOR")),
            _ => None,
        }
    }

    /// Paired output mixes in germline calls tagged `STATUS=Germline`
    pub fn reports_germline_status(self) -> bool {
        self == CallerKind::Vardict
    }
}

/// Extract the caller name from an identity line
pub fn parse_source_line(line: &str) -> Option<&str> {
    line.strip_prefix(SOURCE_PREFIX).map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_kind() {
        assert_eq!(CallerKind::of("strelka"), CallerKind::Strelka);
        assert_eq!(CallerKind::of("vardict"), CallerKind::Vardict);
        assert_eq!(CallerKind::of("Strelka"), CallerKind::Other);
        assert_eq!(CallerKind::of("gatk"), CallerKind::Other);
    }

    #[test]
    fn test_quirks() {
        assert!(CallerKind::Strelka.reports_indel_depth_separately());
        assert!(!CallerKind::Vardict.reports_indel_depth_separately());
        assert_eq!(CallerKind::Strelka.fixed_sample_labels(), Some(("NORMAL", "TUMOR")));
        assert_eq!(CallerKind::Other.fixed_sample_labels(), None);
        assert!(CallerKind::Vardict.reports_germline_status());
        assert!(CallerKind::Strelka.derives_paired_allele_depth());
        assert!(!CallerKind::Other.derives_paired_allele_depth());
    }

    #[test]
    fn test_parse_source_line() {
        assert_eq!(parse_source_line("##source=strelka"), Some("strelka"));
        assert_eq!(parse_source_line("##source=gatk \r"), Some("gatk"));
        assert_eq!(parse_source_line("##fileformat=VCFv4.2"), None);
    }
}
