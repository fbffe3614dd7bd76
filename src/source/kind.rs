//! Source-kind classification
//!
//! A location string is matched against an ordered table of rules. Location
//! syntax (schemes, extensions) is always consulted before file contents, so
//! a given location classifies the same way regardless of what the file
//! holds unless no location rule applies.

use super::sniff::{self, ContentHint};
use super::{ResolverConfig, SourceError, SourceResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static HEADERED_EDGELIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^h-edgelist\(([^:]*):([^)]*)\)://(.+)$").expect("valid regex")
});

static COLLECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^vertex:(.*);edge:(.*)$").expect("valid regex"));

const EDGELIST_SCHEME: &str = "edgelist://";

/// The format/category of a graph source, driving loader dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Delimited file with a header; two named columns give the endpoints
    HeaderedEdgeList {
        source_column: String,
        target_column: String,
        path: PathBuf,
    },
    /// Plain `u v [weight]` edge list (or a `source,target` headered file)
    EdgeList { path: PathBuf },
    /// Graph Modelling Language, optionally gzip-compressed
    Gml { path: PathBuf, compressed: bool },
    /// GraphML XML, optionally gzip-compressed
    GraphMl { path: PathBuf, compressed: bool },
    /// Python-pickled graph; recognised so it can be rejected clearly
    LegacyPickle { path: PathBuf },
    /// openCypher CSV vertex and edge files
    Collection {
        vertex_files: Vec<PathBuf>,
        edge_files: Vec<PathBuf>,
    },
}

impl SourceKind {
    /// Short human-readable format name
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::HeaderedEdgeList { .. } => "headered edge list",
            SourceKind::EdgeList { .. } => "edge list",
            SourceKind::Gml { .. } => "GML",
            SourceKind::GraphMl { .. } => "GraphML",
            SourceKind::LegacyPickle { .. } => "gpickle",
            SourceKind::Collection { .. } => "openCypher collection",
        }
    }
}

/// A named location rule; rules are evaluated in table order
pub struct LocationRule {
    pub name: &'static str,
    pub matches: fn(&str) -> Option<SourceKind>,
}

/// Location rules in priority order. Content sniffing runs only after every
/// rule here has declined.
pub const LOCATION_RULES: &[LocationRule] = &[
    LocationRule {
        name: "headered-edgelist-scheme",
        matches: match_headered_edge_list,
    },
    LocationRule {
        name: "edgelist-scheme",
        matches: match_edge_list_scheme,
    },
    LocationRule {
        name: "extension",
        matches: match_extension,
    },
    LocationRule {
        name: "vertex-edge-collection",
        matches: match_collection,
    },
];

fn match_headered_edge_list(location: &str) -> Option<SourceKind> {
    let caps = HEADERED_EDGELIST.captures(location)?;
    Some(SourceKind::HeaderedEdgeList {
        source_column: caps[1].to_string(),
        target_column: caps[2].to_string(),
        path: PathBuf::from(&caps[3]),
    })
}

fn match_edge_list_scheme(location: &str) -> Option<SourceKind> {
    location
        .strip_prefix(EDGELIST_SCHEME)
        .map(|path| SourceKind::EdgeList {
            path: PathBuf::from(path),
        })
}

fn match_extension(location: &str) -> Option<SourceKind> {
    let lower = location.to_ascii_lowercase();
    let path = PathBuf::from(location);
    if lower.ends_with(".gml") {
        Some(SourceKind::Gml { path, compressed: false })
    } else if lower.ends_with(".gml.gz") {
        Some(SourceKind::Gml { path, compressed: true })
    } else if lower.ends_with(".graphml") {
        Some(SourceKind::GraphMl { path, compressed: false })
    } else if lower.ends_with(".graphml.gz") {
        Some(SourceKind::GraphMl { path, compressed: true })
    } else if lower.ends_with(".gpickle") {
        Some(SourceKind::LegacyPickle { path })
    } else {
        None
    }
}

fn match_collection(location: &str) -> Option<SourceKind> {
    let caps = COLLECTION.captures(location)?;
    Some(SourceKind::Collection {
        vertex_files: split_file_list(&caps[1]),
        edge_files: split_file_list(&caps[2]),
    })
}

fn split_file_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Classify by location syntax alone
pub fn classify_location(location: &str) -> Option<SourceKind> {
    LOCATION_RULES.iter().find_map(|rule| {
        let kind = (rule.matches)(location)?;
        debug!(rule = rule.name, kind = kind.name(), "location rule matched");
        Some(kind)
    })
}

/// Classify by reading a bounded prefix of the file
pub fn classify_contents(path: &Path, config: &ResolverConfig) -> Option<SourceKind> {
    if !path.is_file() {
        return None;
    }
    let prefix = match sniff::read_prefix(path, config.sniff_bytes) {
        Ok(prefix) => prefix,
        Err(e) => {
            debug!(error = %e, "content sniff could not read file");
            return None;
        }
    };
    let kind = match sniff::sniff_contents(&prefix)? {
        ContentHint::GraphMl => SourceKind::GraphMl {
            path: path.to_path_buf(),
            compressed: false,
        },
        ContentHint::EdgeList => SourceKind::EdgeList {
            path: path.to_path_buf(),
        },
    };
    debug!(kind = kind.name(), "content sniff matched");
    Some(kind)
}

/// Full cascade: location rules, then content sniffing
pub fn classify(location: &str, config: &ResolverConfig) -> SourceResult<SourceKind> {
    classify_location(location)
        .or_else(|| classify_contents(Path::new(location), config))
        .ok_or_else(|| SourceError::Unclassifiable(location.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_headered_edge_list_scheme() {
        assert_eq!(
            classify_location("h-edgelist(src:tgt)://data/edges.csv"),
            Some(SourceKind::HeaderedEdgeList {
                source_column: "src".to_string(),
                target_column: "tgt".to_string(),
                path: PathBuf::from("data/edges.csv"),
            })
        );
    }

    #[test]
    fn test_scheme_beats_extension() {
        // Both schemes take priority over the extension table
        assert_eq!(
            classify_location("edgelist://graph.gml"),
            Some(SourceKind::EdgeList { path: PathBuf::from("graph.gml") })
        );
        assert!(matches!(
            classify_location("h-edgelist(a:b)://graph.graphml"),
            Some(SourceKind::HeaderedEdgeList { .. })
        ));
    }

    #[test]
    fn test_extension_table() {
        assert_eq!(
            classify_location("g.gml"),
            Some(SourceKind::Gml { path: "g.gml".into(), compressed: false })
        );
        assert_eq!(
            classify_location("g.gml.gz"),
            Some(SourceKind::Gml { path: "g.gml.gz".into(), compressed: true })
        );
        assert_eq!(
            classify_location("g.graphml"),
            Some(SourceKind::GraphMl { path: "g.graphml".into(), compressed: false })
        );
        assert_eq!(
            classify_location("g.GraphML.gz"),
            Some(SourceKind::GraphMl { path: "g.GraphML.gz".into(), compressed: true })
        );
        assert_eq!(
            classify_location("g.gpickle"),
            Some(SourceKind::LegacyPickle { path: "g.gpickle".into() })
        );
        assert_eq!(classify_location("g.csv"), None);
    }

    #[test]
    fn test_collection_syntax() {
        assert_eq!(
            classify_location("vertex:people.csv, places.csv;edge:knows.csv"),
            Some(SourceKind::Collection {
                vertex_files: vec!["people.csv".into(), "places.csv".into()],
                edge_files: vec!["knows.csv".into()],
            })
        );
    }

    #[test]
    fn test_extension_checked_before_collection() {
        assert!(matches!(
            classify_location("vertex:v.csv;edge:e.gml"),
            Some(SourceKind::Gml { .. })
        ));
    }

    #[test]
    fn test_location_rules_ignore_contents() {
        let mut file = tempfile::Builder::new().suffix(".gml").tempfile().unwrap();
        writeln!(file, "<graphml>").unwrap();
        let location = file.path().to_string_lossy().to_string();
        let kind = classify(&location, &ResolverConfig::default()).unwrap();
        assert!(matches!(kind, SourceKind::Gml { .. }));
    }

    #[test]
    fn test_content_sniff_fallback() {
        let mut graphml = tempfile::NamedTempFile::new().unwrap();
        write!(graphml, "<?xml version=\"1.0\"?><graphml></graphml>").unwrap();
        let location = graphml.path().to_string_lossy().to_string();
        assert!(matches!(
            classify(&location, &ResolverConfig::default()).unwrap(),
            SourceKind::GraphMl { compressed: false, .. }
        ));

        let mut csv = tempfile::NamedTempFile::new().unwrap();
        write!(csv, "source,target\na,b\n").unwrap();
        let location = csv.path().to_string_lossy().to_string();
        assert!(matches!(
            classify(&location, &ResolverConfig::default()).unwrap(),
            SourceKind::EdgeList { .. }
        ));
    }

    #[test]
    fn test_content_sniff_is_bounded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}<graphml>", " ".repeat(600)).unwrap();
        let location = file.path().to_string_lossy().to_string();
        assert!(matches!(
            classify(&location, &ResolverConfig::default()),
            Err(SourceError::Unclassifiable(_))
        ));
    }

    #[test]
    fn test_unclassifiable() {
        assert!(matches!(
            classify("/definitely/not/here.dat", &ResolverConfig::default()),
            Err(SourceError::Unclassifiable(loc)) if loc == "/definitely/not/here.dat"
        ));
    }
}
