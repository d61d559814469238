use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::IdmapError;

/// Namespaces a cross-reference can live in. `Rhea` is the primary source;
/// the rest are the vocabularies `rhea2xrefs` points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Rhea,
    EnzymeCode,
    KeggReaction,
    Reactome,
    BioCyc,
    Macie,
    Unipathway,
    Uniprot,
}

impl DataSource {
    pub const ALL: [DataSource; 8] = [
        DataSource::Rhea,
        DataSource::EnzymeCode,
        DataSource::KeggReaction,
        DataSource::Reactome,
        DataSource::BioCyc,
        DataSource::Macie,
        DataSource::Unipathway,
        DataSource::Uniprot,
    ];

    /// BridgeDb system code, stored in the `code` columns of the database.
    pub fn system_code(&self) -> &'static str {
        match self {
            DataSource::Rhea => "Rh",
            DataSource::EnzymeCode => "E",
            DataSource::KeggReaction => "Rk",
            DataSource::Reactome => "Re",
            DataSource::BioCyc => "Bc",
            DataSource::Macie => "Cm",
            DataSource::Unipathway => "Up",
            DataSource::Uniprot => "S",
        }
    }

    /// Short tag used when displaying an [`Xref`].
    pub fn tag(&self) -> &'static str {
        match self {
            DataSource::Rhea => "RHEA",
            DataSource::EnzymeCode => "EC",
            DataSource::KeggReaction => "KEGG_REACTION",
            DataSource::Reactome => "REACTOME",
            DataSource::BioCyc => "BIOCYC",
            DataSource::Macie => "MACIE",
            DataSource::Unipathway => "UNIPATHWAY",
            DataSource::Uniprot => "UNIPROT",
        }
    }

    pub fn from_system_code(code: &str) -> Option<DataSource> {
        Self::ALL
            .iter()
            .copied()
            .find(|source| source.system_code() == code)
    }
}

/// Namespace tags found in column 4 of `rhea2xrefs`, and where they land.
/// METACYC and ECOCYC are both folded into BioCyc.
pub const SOURCE_TAGS: &[(&str, DataSource)] = &[
    ("EC", DataSource::EnzymeCode),
    ("KEGG_REACTION", DataSource::KeggReaction),
    ("REACTOME", DataSource::Reactome),
    ("METACYC", DataSource::BioCyc),
    ("ECOCYC", DataSource::BioCyc),
    ("MACIE", DataSource::Macie),
    ("UNIPATHWAY", DataSource::Unipathway),
    ("UNIPROT", DataSource::Uniprot),
];

/// Resolve a namespace tag. Only `EC` is matched case-insensitively; every
/// other tag must match exactly. Unknown tags resolve to `None`.
pub fn lookup_tag(tag: &str) -> Option<DataSource> {
    if tag.eq_ignore_ascii_case("EC") {
        return Some(DataSource::EnzymeCode);
    }
    SOURCE_TAGS
        .iter()
        .find(|(known, _)| *known == tag)
        .map(|(_, source)| *source)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xref {
    id: String,
    source: DataSource,
}

impl Xref {
    pub fn new(id: impl Into<String>, source: DataSource) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }

    pub fn rhea(id: impl Into<String>) -> Self {
        Self::new(id, DataSource::Rhea)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> DataSource {
        self.source
    }
}

impl fmt::Display for Xref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.tag(), self.id)
    }
}

/// How the loader emits links for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmissionMode {
    /// Each entity and link is emitted once, when first seen.
    #[default]
    Once,
    /// After every line, re-emit the primary self-link and every link
    /// accumulated so far in the group.
    PerLine,
}

impl fmt::Display for EmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmissionMode::Once => write!(f, "once"),
            EmissionMode::PerLine => write!(f, "per-line"),
        }
    }
}

impl FromStr for EmissionMode {
    type Err = IdmapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "once" => Ok(EmissionMode::Once),
            "per-line" | "per_line" | "perline" => Ok(EmissionMode::PerLine),
            _ => Err(IdmapError::InvalidEmissionMode(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn lookup_known_tags() {
        assert_eq!(lookup_tag("KEGG_REACTION"), Some(DataSource::KeggReaction));
        assert_eq!(lookup_tag("UNIPROT"), Some(DataSource::Uniprot));
        assert_eq!(lookup_tag("ec"), Some(DataSource::EnzymeCode));
    }

    #[test]
    fn biocyc_tags_share_namespace() {
        assert_eq!(lookup_tag("METACYC"), Some(DataSource::BioCyc));
        assert_eq!(lookup_tag("ECOCYC"), Some(DataSource::BioCyc));
    }

    #[test]
    fn unknown_tags_resolve_to_none() {
        assert_eq!(lookup_tag("GO"), None);
        assert_eq!(lookup_tag("uniprot"), None);
        assert_eq!(lookup_tag(""), None);
    }

    #[test]
    fn system_codes_round_trip() {
        for source in DataSource::ALL {
            assert_eq!(
                DataSource::from_system_code(source.system_code()),
                Some(source)
            );
        }
    }

    #[test]
    fn xref_display_and_equality() {
        let ec = Xref::new("1.1.1.1", DataSource::EnzymeCode);
        assert_eq!(ec.to_string(), "EC:1.1.1.1");
        assert_eq!(ec, Xref::new("1.1.1.1".to_string(), DataSource::EnzymeCode));
        assert_ne!(ec, Xref::new("1.1.1.1", DataSource::KeggReaction));
    }

    #[test]
    fn parse_emission_mode() {
        assert_eq!("per-line".parse::<EmissionMode>().unwrap(), EmissionMode::PerLine);
        assert_eq!("Once".parse::<EmissionMode>().unwrap(), EmissionMode::Once);
        let err = "twice".parse::<EmissionMode>().unwrap_err();
        assert_matches!(err, IdmapError::InvalidEmissionMode(_));
    }
}
