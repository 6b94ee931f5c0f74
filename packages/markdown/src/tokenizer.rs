use logos::Logos;

/// Inline markdown tokens
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum InlineToken<'src> {
    // Backslash before ASCII punctuation
    #[regex(r#"\\[!-/:-@\[-`{-~]"#, |lex| &lex.slice()[1..])]
    Escaped(&'src str),

    #[token("\\\n")]
    HardBreak,

    #[token("**")]
    DoubleStar,

    #[token("__")]
    DoubleUnderscore,

    #[token("*")]
    Star,

    #[token("_")]
    Underscore,

    #[regex(r"`+", |lex| lex.slice().len())]
    Backticks(usize),

    #[token("![")]
    ImageOpen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"<[a-zA-Z][^<>\n]*>", |lex| lex.slice())]
    HtmlOpen(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t]*>", |lex| lex.slice())]
    HtmlClose(&'src str),

    #[token("\n")]
    Newline,

    #[regex(r"[^\\*_`!\[\]()<\n]+", |lex| lex.slice())]
    Text(&'src str),

    #[token("!")]
    Bang,

    #[token("\\")]
    Backslash,

    #[token("<")]
    LAngle,
}

impl<'src> InlineToken<'src> {
    /// Emphasis delimiters
    pub fn is_delimiter(&self) -> bool {
        matches!(
            self,
            InlineToken::Star
                | InlineToken::Underscore
                | InlineToken::DoubleStar
                | InlineToken::DoubleUnderscore
        )
    }
}

/// Tokenize inline markdown, keeping byte spans.
///
/// The lexer does not backtrack, so an unterminated tag such as `<a b`
/// comes back as an error span. Those bytes are kept as plain text.
pub fn tokenize(source: &str) -> Vec<(InlineToken<'_>, std::ops::Range<usize>)> {
    let lexer = InlineToken::lexer(source);
    lexer
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => (token, span),
            Err(_) => (InlineToken::Text(&source[span.clone()]), span),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<InlineToken<'_>> {
        tokenize(source).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_emphasis_delimiters() {
        assert_eq!(
            kinds("Some *text*."),
            vec![
                InlineToken::Text("Some "),
                InlineToken::Star,
                InlineToken::Text("text"),
                InlineToken::Star,
                InlineToken::Text("."),
            ]
        );
        assert_eq!(
            kinds("***"),
            vec![InlineToken::DoubleStar, InlineToken::Star]
        );
    }

    #[test]
    fn test_escapes_and_breaks() {
        assert_eq!(
            kinds("a\\*b\\\nc"),
            vec![
                InlineToken::Text("a"),
                InlineToken::Escaped("*"),
                InlineToken::Text("b"),
                InlineToken::HardBreak,
                InlineToken::Text("c"),
            ]
        );
    }

    #[test]
    fn test_links_images_and_code() {
        assert_eq!(
            kinds("![a](b) `c`"),
            vec![
                InlineToken::ImageOpen,
                InlineToken::Text("a"),
                InlineToken::RBracket,
                InlineToken::LParen,
                InlineToken::Text("b"),
                InlineToken::RParen,
                InlineToken::Text(" "),
                InlineToken::Backticks(1),
                InlineToken::Text("c"),
                InlineToken::Backticks(1),
            ]
        );
    }

    #[test]
    fn test_html_tags() {
        let tokens = kinds(r#"<u>x</u> < y"#);
        assert_eq!(tokens[0], InlineToken::HtmlOpen("<u>"));
        assert_eq!(tokens[2], InlineToken::HtmlClose("</u>"));
        assert!(tokens.contains(&InlineToken::LAngle));
    }

    #[test]
    fn test_every_byte_is_covered() {
        let source = "a!b\\ <3 [x] (y) _z_ __w__";
        let covered: usize = tokenize(source).iter().map(|(_, span)| span.len()).sum();
        assert_eq!(covered, source.len());
    }

    #[test]
    fn test_unterminated_tags_stay_text() {
        for source in ["x <a b", "a <b", "if x <a\nthen", "<a\n:", "1 <x2 y"] {
            let tokens = tokenize(source);
            let covered: usize = tokens.iter().map(|(_, span)| span.len()).sum();
            assert_eq!(covered, source.len(), "{source:?}");

            let text: String = tokens
                .iter()
                .map(|(_, span)| &source[span.clone()])
                .collect();
            assert_eq!(text, source);
        }
        assert!(kinds("a <b").iter().all(|t| !matches!(t, InlineToken::HtmlOpen(_))));
    }
}
