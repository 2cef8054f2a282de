//! Lexer for callable bodies, built on the logos library.

use alloc::string::String;
use alloc::vec::Vec;

use logos::Logos;

use crate::error::LexError;
use crate::token::{Span, Token};

/// Convert source text into a token stream with byte spans.
///
/// Lexing stops at the first character that starts no token.
///
/// # Examples
///
/// ```
/// use og_script::{Token, tokenize};
///
/// let tokens: Vec<Token> = tokenize("return a * b;")
///     .unwrap()
///     .into_iter()
///     .map(|(token, _)| token)
///     .collect();
///
/// assert_eq!(tokens[0], Token::Return);
/// assert_eq!(tokens[2], Token::Star);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(LexError {
                    text: String::from(lexer.slice()),
                    span,
                });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::tokenize;
    use crate::token::{Span, Token};
    use alloc::string::String;
    use alloc::vec::Vec;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("let letter = this.value"),
            [
                Token::Let,
                Token::Ident(String::from("letter")),
                Token::Equal,
                Token::This,
                Token::Dot,
                Token::Ident(String::from("value")),
            ]
        );
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("a === b ** 2 ?? c"),
            [
                Token::Ident(String::from("a")),
                Token::EqualEqualEqual,
                Token::Ident(String::from("b")),
                Token::StarStar,
                Token::Number(2.0),
                Token::QuestionQuestion,
                Token::Ident(String::from("c")),
            ]
        );
    }

    #[test]
    fn strings_and_comments() {
        assert_eq!(
            kinds("'it\\'s' // trailing\n/* block */ \"two\\nlines\""),
            [
                Token::Str(String::from("it's")),
                Token::Str(String::from("two\nlines")),
            ]
        );
    }

    #[test]
    fn block_comments() {
        assert_eq!(kinds("/**/1"), [Token::Number(1.0)]);
        assert_eq!(kinds("/** doc **/ a /* x * y */ * b"), [
            Token::Ident(String::from("a")),
            Token::Star,
            Token::Ident(String::from("b")),
        ]);
        assert_eq!(kinds("a /* one */ /* two */"), [Token::Ident(String::from("a"))]);
    }

    #[test]
    fn unterminated_block_comment() {
        let err = tokenize("a /* open").unwrap_err();
        assert_eq!(err.text, "/* open");
        assert_eq!(err.span, Span::new(2, 9));
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("1.5e2 7"), [Token::Number(150.0), Token::Number(7.0)]);
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("a # b").unwrap_err();
        assert_eq!(err.text, "#");
        assert_eq!(err.span, Span::new(2, 3));
    }
}
