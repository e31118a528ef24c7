//! Answer grounding parser
//!
//! The model is asked for `{"content": ..., "urls": [{"1": url}, ...]}`.
//! Malformed output is routine, so parsing yields a two-variant value
//! instead of an error: `Decoded` when the schema holds, `Fallback` with
//! the raw text otherwise. Either way the caller gets displayable text.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Fence that marks a markdown code block
const FENCE: &str = "```";

/// How citation links are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    /// `<a href="URL">[n]</a>`
    #[default]
    Html,
    /// `[n](URL)`
    Markdown,
}

impl CitationStyle {
    pub fn render(&self, marker: &str, url: &str) -> String {
        match self {
            CitationStyle::Html => {
                format!("<a href=\"{}\">[{}]</a>", url.replace('"', "&quot;"), marker)
            }
            CitationStyle::Markdown => format!("[{}]({})", marker, url),
        }
    }
}

/// One marker -> URL pair, in the order the model listed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub marker: String,
    pub url: String,
}

/// Outcome of parsing a raw model answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAnswer {
    /// Schema-valid answer
    Decoded {
        content: String,
        citations: Vec<Citation>,
    },
    /// Anything else, kept verbatim
    Fallback(String),
}

/// Wire shape of the structured answer
#[derive(Debug, Deserialize)]
struct StructuredAnswer {
    content: String,
    #[serde(default)]
    urls: Option<Vec<BTreeMap<String, String>>>,
}

impl ParsedAnswer {
    /// Unwrap, decode and validate a raw model answer
    pub fn parse(raw: &str) -> Self {
        let candidate = unwrap_fenced(raw);

        match serde_json::from_str::<StructuredAnswer>(candidate) {
            Ok(answer) => {
                let citations = answer
                    .urls
                    .unwrap_or_default()
                    .into_iter()
                    .flat_map(|entry| entry.into_iter())
                    .map(|(marker, url)| Citation { marker, url })
                    .collect();
                ParsedAnswer::Decoded {
                    content: answer.content,
                    citations,
                }
            }
            Err(_) => ParsedAnswer::Fallback(raw.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ParsedAnswer::Fallback(_))
    }

    /// Final user-facing text
    pub fn render(&self, style: CitationStyle) -> String {
        match self {
            ParsedAnswer::Decoded { content, citations } => rewrite_citations(content, citations, style),
            ParsedAnswer::Fallback(raw) => raw.clone(),
        }
    }
}

/// Parser bound to a citation style
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerParser {
    style: CitationStyle,
}

impl AnswerParser {
    pub fn new(style: CitationStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> CitationStyle {
        self.style
    }

    /// Parse and render in one step; never fails
    pub fn parse(&self, raw: &str) -> String {
        ParsedAnswer::parse(raw).render(self.style)
    }
}

/// Inside a fenced block take the outermost `{...}`; otherwise the raw text
fn unwrap_fenced(raw: &str) -> &str {
    if !raw.contains(FENCE) {
        return raw;
    }
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw,
    }
}

/// Replace every `[marker]` that has a URL with a rendered link
///
/// Single left-to-right pass: rendered links are never rescanned, and for
/// a marker listed twice the later URL wins.
fn rewrite_citations(content: &str, citations: &[Citation], style: CitationStyle) -> String {
    if citations.is_empty() {
        return content.to_string();
    }

    let mut links: HashMap<&str, &str> = HashMap::with_capacity(citations.len());
    for citation in citations {
        links.insert(citation.marker.as_str(), citation.url.as_str());
    }

    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) => match links.get(&after[..close]) {
                Some(url) => {
                    out.push_str(&style.render(&after[..close], url));
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('[');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
