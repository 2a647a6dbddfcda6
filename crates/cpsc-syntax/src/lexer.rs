//! Tokenizes source into a flat vector of span-based tokens. Whitespace and
//! comments never reach the token stream (skipped by the logos definition);
//! there is no lossless trivia to preserve since nothing downstream reprints
//! source text verbatim.

use cpsc_util::Span;
use logos::Logos;

use crate::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Runs of unrecognized characters are coalesced into a single `Error` token
/// rather than one per byte.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut error_start: Option<u32> = None;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token {
                        kind: TokenKind::Error,
                        span: Span::new(start, span.start as u32),
                    });
                }
                tokens.push(Token {
                    kind,
                    span: Span::new(span.start as u32, span.end as u32),
                });
            }
            Err(()) => {
                if error_start.is_none() {
                    error_start = Some(span.start as u32);
                }
            }
        }
    }
    if let Some(start) = error_start.take() {
        tokens.push(Token {
            kind: TokenKind::Error,
            span: Span::new(start, source.len() as u32),
        });
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::at(source.len() as u32),
    });
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_keywords_and_identifiers() {
        let tokens = lex("let x = 1;");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::IntLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn coalesces_garbage_runs() {
        let tokens = lex("let $$ x");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].span, Span::new(4, 7));
    }

    #[test]
    fn skips_comments() {
        let tokens = lex("// hi\nlet /* block */ x = 1;");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::IntLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }
}
