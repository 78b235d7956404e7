//! HTML cleaning and chunking ahead of language-model extraction

use regex::Regex;
use std::sync::LazyLock;

/// Elements removed together with everything inside them
const DROPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "iframe", "svg", "template", "nav", "header", "footer",
    "form", "button", "select", "aside",
];

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));

static DROPPED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DROPPED_ELEMENTS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("element pattern"))
        .collect()
});

/// Opening tags of the content regions, most specific first; group 1 is the tag name
const REGION_OPENERS: &[&str] = &[
    r"<(main)\b[^>]*>",
    r"<(article)\b[^>]*>",
    r#"<([a-z][a-z0-9]*)\b[^>]*\srole\s*=\s*["']main["'][^>]*>"#,
    r#"<([a-z][a-z0-9]*)\b[^>]*\sclass\s*=\s*["'](?:[^"']*\s)?article__body(?:\s[^"']*)?["'][^>]*>"#,
    r#"<([a-z][a-z0-9]*)\b[^>]*\sclass\s*=\s*["'](?:[^"']*\s)?content(?:\s[^"']*)?["'][^>]*>"#,
    r#"<([a-z][a-z0-9]*)\b[^>]*\sid\s*=\s*["']content["'][^>]*>"#,
    r"<(body)\b[^>]*>",
];

static REGIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    REGION_OPENERS
        .iter()
        .map(|opener| Regex::new(&format!("(?is){opener}")).expect("region pattern"))
        .collect()
});

static BLOCK_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|div|section|article|main|li|ul|ol|dl|dt|dd|h[1-6]|br|hr|tr|table|blockquote|figure|figcaption|pre)\b[^>]*>")
        .expect("block pattern")
});

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern"));

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("entity pattern"));

/// Reduce rendered markup to readable text, one paragraph per line
pub fn clean_html(html: &str) -> String {
    let mut text = COMMENTS.replace_all(html, " ").into_owned();
    for element in DROPPED.iter() {
        text = element.replace_all(&text, " ").into_owned();
    }

    // Prefer the main content region when the page marks one
    let region = content_region(&text).unwrap_or(&text);

    let text = BLOCK_TAGS.replace_all(region, "\n");
    let text = TAGS.replace_all(&text, " ");
    let text = decode_entities(&text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inner markup of the first region found, up to the last closing tag of the same name
fn content_region(html: &str) -> Option<&str> {
    REGIONS.iter().find_map(|opener| {
        let caps = opener.captures(html)?;
        let start = caps.get(0)?.end();
        let tag = caps.get(1)?.as_str().to_ascii_lowercase();
        let rest = &html[start..];
        let end = rest.to_ascii_lowercase().rfind(&format!("</{tag}"))?;
        Some(&rest[..end])
    })
}

/// Decode the named entities common in article text plus numeric references
pub fn decode_entities(text: &str) -> String {
    let decoded = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x').or_else(|| raw.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32).map(String::from).unwrap_or_default()
    });

    decoded
        .replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&ndash;", "–")
        .replace("&mdash;", "—")
        .replace("&rsquo;", "’")
        .replace("&lsquo;", "‘")
        .replace("&amp;", "&")
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Paragraph (line) boundaries are preferred; an oversized paragraph is split
/// between words. A single word longer than `max_chars` becomes its own chunk.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in text.lines().map(str::trim).filter(|p| !p.is_empty()) {
        let paragraph_len = paragraph.chars().count();

        if paragraph_len > max_chars {
            flush(&mut chunks, &mut current, &mut current_len);
            for word in paragraph.split_whitespace() {
                append(&mut chunks, &mut current, &mut current_len, word, ' ', max_chars);
            }
            flush(&mut chunks, &mut current, &mut current_len);
            continue;
        }

        append(&mut chunks, &mut current, &mut current_len, paragraph, '\n', max_chars);
    }

    flush(&mut chunks, &mut current, &mut current_len);
    chunks
}

fn append(chunks: &mut Vec<String>, current: &mut String, current_len: &mut usize, piece: &str, sep: char, max_chars: usize) {
    let piece_len = piece.chars().count();
    if *current_len > 0 && *current_len + 1 + piece_len > max_chars {
        flush(chunks, current, current_len);
    }
    if *current_len > 0 {
        current.push(sep);
        *current_len += 1;
    }
    current.push_str(piece);
    *current_len += piece_len;
}

fn flush(chunks: &mut Vec<String>, current: &mut String, current_len: &mut usize) {
    if *current_len > 0 {
        chunks.push(std::mem::take(current));
        *current_len = 0;
    }
}
