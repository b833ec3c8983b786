//! Component output templates.
//!
//! A template such as `{${prefix}-${value}}` is used in two directions:
//! rendering a node to its canonical marker text, and deriving the regex
//! that recognizes that same marker text inside free text.

use crate::lexer::{tokenize_template, TemplateToken};

/// Characters a canonical payload may contain
pub const PAYLOAD_PATTERN: &str = r"[^\s{}\[\]<>]+";

const ID_PATTERN: &str = r"[A-Za-z0-9_\-]+";

/// Default output template
pub const DEFAULT_TEMPLATE: &str = "{${prefix+value}}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Prefix,
    Suffix,
    Value,
    PrefixValue,
    Id,
}

/// Values substituted into a template
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars<'a> {
    pub prefix: &'a str,
    pub suffix: &'a str,
    pub value: &'a str,
    pub id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        let mut segments: Vec<Segment> = Vec::new();

        for (token, _) in tokenize_template(source) {
            let segment = match token {
                TemplateToken::Prefix => Segment::Prefix,
                TemplateToken::Suffix => Segment::Suffix,
                TemplateToken::Value => Segment::Value,
                TemplateToken::PrefixValue => Segment::PrefixValue,
                TemplateToken::Id => Segment::Id,
                other => {
                    // Adjacent literal pieces collapse into one segment
                    if let Some(Segment::Literal(text)) = segments.last_mut() {
                        text.push_str(other.as_source());
                        continue;
                    }
                    Segment::Literal(other.as_source().to_string())
                }
            };
            segments.push(segment);
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template references the payload at all
    pub fn uses_value(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Value | Segment::PrefixValue))
    }

    /// Substitute variables; the result is trimmed
    pub fn render(&self, vars: &TemplateVars<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Prefix => out.push_str(vars.prefix),
                Segment::Suffix => out.push_str(vars.suffix),
                Segment::Value => out.push_str(vars.value),
                Segment::PrefixValue => {
                    out.push_str(vars.prefix);
                    out.push_str(vars.value);
                }
                Segment::Id => out.push_str(vars.id),
            }
        }
        out.trim().to_string()
    }

    /// Regex recognizing this template's rendered output. The first value
    /// occurrence is the `payload` group.
    pub fn matcher_pattern(&self, prefix: &str, suffix: &str) -> String {
        let mut pattern = String::new();
        let mut captured = false;

        let mut push_value = |pattern: &mut String| {
            if captured {
                pattern.push_str(&format!("(?:{})", PAYLOAD_PATTERN));
            } else {
                pattern.push_str(&format!("(?P<payload>{})", PAYLOAD_PATTERN));
                captured = true;
            }
        };

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
                Segment::Prefix => pattern.push_str(&regex::escape(prefix)),
                Segment::Suffix => pattern.push_str(&regex::escape(suffix)),
                Segment::Value => push_value(&mut pattern),
                Segment::PrefixValue => {
                    pattern.push_str(&regex::escape(prefix));
                    push_value(&mut pattern);
                }
                Segment::Id => pattern.push_str(ID_PATTERN),
            }
        }

        pattern
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::parse(DEFAULT_TEMPLATE)
    }
}
