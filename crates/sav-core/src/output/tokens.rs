use serde::Serialize;

/// Kind of a code file token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Keyword,
    Literal,
    Punctuation,
    TypeName,
    Newline,
    FoldableSectionHeading,
    FoldableSectionContentStart,
    FoldableSectionContentEnd,
}

/// One token of the rendered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    /// Deep-link target; set on section headings and matches the navigation id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind,
            definition_id: None,
        }
    }

    pub fn keyword(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Keyword, value)
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Literal, value)
    }

    pub fn punct(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Punctuation, value)
    }

    pub fn type_name(value: impl Into<String>) -> Self {
        Self::new(TokenKind::TypeName, value)
    }

    pub fn newline() -> Self {
        Self::new(TokenKind::Newline, "")
    }

    pub fn heading(value: impl Into<String>, definition_id: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TokenKind::FoldableSectionHeading,
            definition_id: Some(definition_id.into()),
        }
    }

    /// Leading whitespace for nested lines.
    pub fn indent(level: usize) -> Self {
        Self::literal(" ".repeat(level))
    }
}

/// Appends tokens and keeps foldable sections balanced.
#[derive(Debug, Default)]
pub struct TokenWriter {
    tokens: Vec<Token>,
}

impl TokenWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) {
        self.tokens.extend(tokens);
    }

    /// Write a foldable section: the heading line, then the content written by
    /// `body` between a start and an end token.
    pub fn section(&mut self, heading: &str, id: &str, body: impl FnOnce(&mut Self)) {
        self.push(Token::heading(heading, id));
        self.push(Token::newline());
        self.push(Token::new(TokenKind::FoldableSectionContentStart, ""));
        body(self);
        self.push(Token::new(TokenKind::FoldableSectionContentEnd, ""));
    }

    pub fn finish(self) -> Vec<Token> {
        self.tokens
    }
}

/// Whether every section start is closed by a later end, properly nested.
pub fn is_balanced(tokens: &[Token]) -> bool {
    let mut depth = 0usize;
    for token in tokens {
        match token.kind {
            TokenKind::FoldableSectionContentStart => depth += 1,
            TokenKind::FoldableSectionContentEnd => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

/// Pull leaf sections (a start whose matching end has no nested start) out of
/// the main token list. Headings stay in place so the host can render them
/// collapsed and fetch their content on demand.
pub fn extract_sections(tokens: &[Token]) -> (Vec<Token>, Vec<Vec<Token>>) {
    let mut main = Vec::new();
    let mut sections = Vec::new();
    let mut pending: Vec<Token> = Vec::new();
    let mut is_leaf = false;

    for token in tokens {
        match token.kind {
            TokenKind::FoldableSectionHeading => {
                pending.push(token.clone());
                main.append(&mut pending);
                is_leaf = false;
            }
            TokenKind::FoldableSectionContentStart => {
                pending.push(token.clone());
                is_leaf = true;
            }
            TokenKind::FoldableSectionContentEnd => {
                pending.push(token.clone());
                if is_leaf {
                    sections.push(std::mem::take(&mut pending));
                    is_leaf = false;
                }
            }
            _ => pending.push(token.clone()),
        }
    }
    main.append(&mut pending);
    (main, sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_nested_sections_balance() {
        let mut w = TokenWriter::new();
        w.section("Paths", "a-Paths", |w| {
            w.section("/pets", "a-Paths-/pets", |w| {
                w.push(Token::keyword("get"));
                w.push(Token::newline());
            });
        });
        let tokens = w.finish();
        assert!(is_balanced(&tokens));
        assert_eq!(tokens[0].definition_id.as_deref(), Some("a-Paths"));
    }

    #[test]
    fn test_unbalanced_detected() {
        let tokens = vec![
            Token::new(TokenKind::FoldableSectionContentEnd, ""),
            Token::new(TokenKind::FoldableSectionContentStart, ""),
        ];
        assert!(!is_balanced(&tokens));
    }

    #[test]
    fn test_extract_leaf_sections() {
        let mut w = TokenWriter::new();
        w.section("Outer", "outer", |w| {
            w.section("Inner", "inner", |w| w.push(Token::literal("x")));
        });
        let (main, sections) = extract_sections(&w.finish());

        assert_eq!(sections.len(), 1);
        assert_eq!(
            kinds(&sections[0]),
            vec![
                TokenKind::Newline,
                TokenKind::FoldableSectionContentStart,
                TokenKind::Literal,
                TokenKind::FoldableSectionContentEnd,
            ]
        );
        assert_eq!(
            kinds(&main),
            vec![
                TokenKind::FoldableSectionHeading,
                TokenKind::Newline,
                TokenKind::FoldableSectionContentStart,
                TokenKind::FoldableSectionHeading,
                TokenKind::FoldableSectionContentEnd,
            ]
        );
    }
}
