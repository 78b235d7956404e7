//! Reference extraction from page content
//!
//! Two strategies feed one list. The link scan reads catalog identifiers
//! straight out of the markup. The text pass cleans the markup, splits it into
//! chunks and asks the language model for "Artist - Title" lines, which are
//! then filtered. Link references come first, text references follow in chunk
//! order, and the merged list is deduplicated keeping first occurrences.

use futures_util::stream::{self, StreamExt};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, error, info, warn};

use shared::{dedup_references, Reference, ReferenceKind};

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::services::link_scanner::LinkScanner;
use crate::services::text::{chunk_text, clean_html};
use crate::traits::LlmClient;
use crate::types::{CompletionRequest, ExtractionConfig};

/// Separator between artist and title in model output
const PAIR_SEPARATOR: &str = " - ";

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•·]+|\d+[.)]|\(\d+\))\s*").expect("list marker pattern"));

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ep|eps|single|singles|remix|remixes|remixed|feat|ft|featuring)\b").expect("disallowed pattern")
});

const QUOTES: &[char] = &['"', '\'', '“', '”', '‘', '’', '`'];

/// Turns page content into an ordered, deduplicated list of references
pub struct ReferenceExtractor {
    llm: Arc<dyn LlmClient>,
    config: ExtractionConfig,
    links: LinkScanner,
}

impl ReferenceExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, config: ExtractionConfig) -> Self {
        Self {
            llm,
            config,
            links: LinkScanner::new(),
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run the configured strategies over raw page markup.
    ///
    /// A failed chunk only loses its own references, so a page whose every
    /// chunk failed yields whatever the link scan found.
    pub async fn extract(&self, content: &str) -> AnalyzerResult<Vec<Reference>> {
        let mut references = Vec::new();

        if self.config.mode.scans_links() {
            let linked = self.links.scan(content);
            info!("🔗 Found {} catalog links", linked.len());
            references.extend(linked);
        }

        if self.config.mode.reads_text() {
            let text = clean_html(content);
            let chunks = chunk_text(&text, self.config.chunk_size);
            let total = chunks.len();
            let (named, failed) = self.analyze_chunks(chunks).await;

            if total > 0 && failed == total {
                error!("❌ All {} chunks failed, no references from text", total);
            }
            info!("📝 Language model named {} references in {} chunks", named.len(), total);
            references.extend(named);
        }

        let unique = dedup_references(references);
        info!("✅ Extracted {} unique references", unique.len());
        Ok(unique)
    }

    /// Linked references only
    pub fn scan_links(&self, content: &str) -> Vec<Reference> {
        self.links.scan(content)
    }

    /// References from all chunks in chunk order, and the number of failed chunks
    async fn analyze_chunks(&self, chunks: Vec<String>) -> (Vec<Reference>, usize) {
        let concurrency = self.config.chunk_concurrency.max(1);
        let total = chunks.len();

        let results: Vec<AnalyzerResult<Vec<Reference>>> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move { self.analyze_chunk(index, total, &chunk).await })
            .buffered(concurrency)
            .collect()
            .await;

        let mut references = Vec::new();
        let mut failed = 0;
        for result in results {
            match result {
                Ok(found) => references.extend(found),
                Err(e) => {
                    warn!("⚠️ Skipping chunk: {}", e);
                    failed += 1;
                }
            }
        }
        (references, failed)
    }

    async fn analyze_chunk(&self, index: usize, total: usize, chunk: &str) -> AnalyzerResult<Vec<Reference>> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            system: system_prompt(self.config.target_kind),
            user: user_prompt(self.config.target_kind, chunk),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("Analysing chunk {}/{} ({} chars)", index + 1, total, chunk.chars().count());
        let completion = self
            .config
            .retry
            .retry("language model chunk", |_| self.llm.complete(&request))
            .await
            .map_err(|e| AnalyzerError::AnalysisError {
                chunk: index,
                reason: e.to_string(),
            })?;

        Ok(parse_reference_lines(&completion.content, self.config.target_kind))
    }
}

/// System instruction for the extraction call
pub fn system_prompt(kind: ReferenceKind) -> String {
    let noun = kind_noun(kind);
    format!(
        "You extract music {noun} references from article text.\n\
         Rules:\n\
         1. Only list a {noun} when both the artist and the {noun} title are named in the text.\n\
         2. Format each pair exactly as: Artist - Title\n\
         3. Write one pair per line.\n\
         4. Exclude singles, EPs, remixes and tracks credited with featured artists.\n\
         5. Do not number or bullet the lines.\n\
         6. Do not add commentary, headings or explanations.\n\
         7. Keep artist and title spelling exactly as written in the text.\n\
         8. If no {noun} qualifies, reply with nothing."
    )
}

fn user_prompt(kind: ReferenceKind, chunk: &str) -> String {
    format!("List every {} named in this text:\n\n{}", kind_noun(kind), chunk)
}

fn kind_noun(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Album => "album",
        ReferenceKind::Song => "song",
    }
}

/// Parse model output into references, deduplicated in line order
pub fn parse_reference_lines(output: &str, kind: ReferenceKind) -> Vec<Reference> {
    dedup_references(output.lines().filter_map(|line| parse_reference_line(line, kind)))
}

/// One "Artist - Title" line, or `None` if the line is malformed or disallowed
pub fn parse_reference_line(line: &str, kind: ReferenceKind) -> Option<Reference> {
    let line = LIST_MARKER.replace(line.trim(), "");
    let line = line.trim().trim_matches(QUOTES).trim();

    if DISALLOWED.is_match(line) {
        return None;
    }

    let (artist, title) = line.split_once(PAIR_SEPARATOR)?;
    let artist = artist.trim().trim_matches(QUOTES).trim();
    let title = title.trim().trim_matches(QUOTES).trim();

    if artist.is_empty() || title.is_empty() {
        return None;
    }
    Some(Reference::named(kind, artist, title))
}
