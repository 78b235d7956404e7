//! Deterministic catalog link scanning
//!
//! Catalog identifiers are exactly [`CATALOG_ID_LEN`] alphanumeric characters.
//! Each pattern captures the whole alphanumeric run after the kind segment, so
//! an over-long run is rejected instead of being read as a truncated id.

use regex::Regex;
use std::sync::LazyLock;

use shared::{dedup_references, Reference, ReferenceKind};

/// Length of a catalog identifier
pub const CATALOG_ID_LEN: usize = 22;

/// Link families found in page markup: canonical web links, URI scheme,
/// attribute-embedded links, embed and API forms, bare paths.
const LINK_PATTERNS: &[&str] = &[
    r"open\.spotify\.com/(?:intl-[a-zA-Z]{2}(?:-[a-zA-Z]{2})?/)?(?:embed/)?(album|track)/([A-Za-z0-9]+)",
    r"spotify:(album|track):([A-Za-z0-9]+)",
    r#"href=["'][^"']*?/(album|track)/([A-Za-z0-9]+)"#,
    r#"data-uri=["']spotify:(album|track):([A-Za-z0-9]+)"#,
    r"embed/(album|track)/([A-Za-z0-9]+)",
    r"api\.spotify\.com/v1/(album|track)s/([A-Za-z0-9]+)",
    r"/(album|track)/([A-Za-z0-9]+)",
];

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    LINK_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("link pattern"))
        .collect()
});

/// Scans raw markup for catalog links
#[derive(Debug, Clone, Default)]
pub struct LinkScanner {
    kinds: Option<ReferenceKind>,
}

impl LinkScanner {
    /// Scanner accepting album and track links
    pub fn new() -> Self {
        Self { kinds: None }
    }

    /// Scanner that keeps only links of one kind
    pub fn only(kind: ReferenceKind) -> Self {
        Self { kinds: Some(kind) }
    }

    /// Linked references in order of first appearance
    pub fn scan(&self, content: &str) -> Vec<Reference> {
        let content = unescape(content);
        let mut found: Vec<(usize, Reference)> = Vec::new();

        for pattern in PATTERNS.iter() {
            for caps in pattern.captures_iter(&content) {
                let (Some(kind), Some(id)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                if id.as_str().len() != CATALOG_ID_LEN {
                    continue;
                }
                let kind = match kind.as_str() {
                    "track" => ReferenceKind::Song,
                    _ => ReferenceKind::Album,
                };
                if self.kinds.is_some_and(|wanted| wanted != kind) {
                    continue;
                }
                found.push((id.start(), Reference::linked(kind, id.as_str())));
            }
        }

        found.sort_by_key(|(position, _)| *position);
        dedup_references(found.into_iter().map(|(_, reference)| reference))
    }
}

/// Undo JSON and HTML escaping that hides links inside scripts and attributes
fn unescape(content: &str) -> String {
    content.replace("\\/", "/").replace("&amp;", "&")
}
