use logos::Logos;
use std::fmt;

/// Tokens of a component output template such as `{${prefix}-${value}}`
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum TemplateToken<'src> {
    #[token("${prefix+value}")]
    PrefixValue,

    #[token("${prefix}")]
    Prefix,

    #[token("${suffix}")]
    Suffix,

    #[token("${value}")]
    Value,

    #[token("${id}")]
    Id,

    // Unknown variables are kept verbatim
    #[regex(r"\$\{[^}]*\}", |lex| lex.slice())]
    Unknown(&'src str),

    #[regex(r"[^$]+", |lex| lex.slice())]
    Text(&'src str),

    #[token("$")]
    Dollar,
}

impl<'src> TemplateToken<'src> {
    /// Source text of the token
    pub fn as_source(&self) -> &'src str {
        match self {
            TemplateToken::PrefixValue => "${prefix+value}",
            TemplateToken::Prefix => "${prefix}",
            TemplateToken::Suffix => "${suffix}",
            TemplateToken::Value => "${value}",
            TemplateToken::Id => "${id}",
            TemplateToken::Unknown(s) | TemplateToken::Text(s) => s,
            TemplateToken::Dollar => "$",
        }
    }
}

impl<'src> fmt::Display for TemplateToken<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_source())
    }
}

/// Tokenize a template. Unlexable input becomes literal text.
pub fn tokenize_template(source: &str) -> Vec<(TemplateToken<'_>, std::ops::Range<usize>)> {
    let lexer = TemplateToken::lexer(source);
    lexer
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => (token, span),
            Err(()) => (TemplateToken::Text(&source[span.clone()]), span),
        })
        .collect()
}
