/// Condition language lexer: raw script → flat tokens → phrase tokens.
///
/// The language reads like English: `character has trait "Brave" and
/// party strength > 10`. Scanning produces one token per word or symbol;
/// a second pass folds the words that make up a test into a single
/// [`Phrase`] so the tree builder only ever sees operands and operators.

use std::fmt;
use std::iter::Peekable;
use thiserror::Error;

use crate::schema::stat::CharacterStat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("an invalid character '{character}' was encountered at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("lexing error: {0}")]
    Lexing(String),
}

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

/// Stat comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Gt,
    Lt,
    Eq,
    Ne,
}

impl Comparison {
    pub fn compare(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "=",
            Self::Ne => "!=",
        }
    }
}

/// The subject a phrase is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Each character in the roster, true if any one passes.
    Character,
    /// The roster as a whole: stats summed, traits unioned.
    Party,
    Encounter,
    Session,
}

impl Target {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Party => "party",
            Self::Encounter => "encounter",
            Self::Session => "session",
        }
    }
}

/// `<stat> <comparison> <number>`, e.g. `strength > 10`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatPhrase {
    pub stat: CharacterStat,
    pub comparison: Comparison,
    pub number: i32,
}

/// `[has] [not] trait "A" ["B" ...]`.
///
/// True when every listed trait is present; `inverse` flips that to
/// "not all of them are present".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitPhrase {
    pub inverse: bool,
    pub traits: Vec<String>,
}

/// A leaf test, produced by folding raw tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phrase {
    Stat(StatPhrase),
    Trait(TraitPhrase),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    String(String),
    Number(i32),
    Stat(CharacterStat),
    Bool(BoolOp),
    Comparison(Comparison),
    Target(Target),
    OpenParen,
    CloseParen,
    Comma,
    Has,
    Not,
    Trait,
    Phrase(Phrase),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "string \"{s}\""),
            Self::Number(n) => write!(f, "number {n}"),
            Self::Stat(stat) => write!(f, "stat {stat}"),
            Self::Bool(BoolOp::And) => f.write_str("'and'"),
            Self::Bool(BoolOp::Or) => f.write_str("'or'"),
            Self::Comparison(c) => write!(f, "comparison '{}'", c.symbol()),
            Self::Target(t) => write!(f, "target '{}'", t.keyword()),
            Self::OpenParen => f.write_str("'('"),
            Self::CloseParen => f.write_str("')'"),
            Self::Comma => f.write_str("','"),
            Self::Has => f.write_str("'has'"),
            Self::Not => f.write_str("'not'"),
            Self::Trait => f.write_str("'trait'"),
            Self::Phrase(Phrase::Stat(_)) => f.write_str("stat phrase"),
            Self::Phrase(Phrase::Trait(_)) => f.write_str("trait phrase"),
        }
    }
}

/// Look up a lowercase word in the keyword table.
fn keyword(word: &str) -> Option<Token> {
    let token = match word {
        "and" => Token::Bool(BoolOp::And),
        "or" => Token::Bool(BoolOp::Or),
        "character" => Token::Target(Target::Character),
        "party" => Token::Target(Target::Party),
        "encounter" | "storyboard" => Token::Target(Target::Encounter),
        "session" => Token::Target(Target::Session),
        "has" => Token::Has,
        "not" => Token::Not,
        "trait" => Token::Trait,
        other => Token::Stat(CharacterStat::from_keyword(other)?),
    };
    Some(token)
}

/// Tokenize a condition script, folding phrase words into phrase tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ConditionError> {
    let raw = scan(input)?;
    fold_phrases(raw)
}

/// First pass: one token per word or symbol.
pub fn scan(input: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, next)) = chars.peek() {
        if next.is_whitespace() {
            chars.next();
            continue;
        }

        if next.is_ascii_digit() || next == '-' {
            tokens.push(scan_number(&mut chars)?);
        } else if next.is_alphabetic() {
            tokens.push(scan_keyword(&mut chars)?);
        } else if next == '"' {
            tokens.push(scan_string(&mut chars, position)?);
        } else {
            chars.next();
            let token = match next {
                '(' => Token::OpenParen,
                ')' => Token::CloseParen,
                ',' => Token::Comma,
                '>' => Token::Comparison(Comparison::Gt),
                '<' => Token::Comparison(Comparison::Lt),
                '=' => Token::Comparison(Comparison::Eq),
                '!' => match chars.next() {
                    Some((_, '=')) => Token::Comparison(Comparison::Ne),
                    _ => {
                        return Err(ConditionError::Lexing(format!(
                            "'!' at position {position} must be followed by '=' \
                             to form \"not equal\""
                        )))
                    }
                },
                character => {
                    return Err(ConditionError::InvalidCharacter {
                        character,
                        position,
                    })
                }
            };
            tokens.push(token);
        }
    }

    Ok(tokens)
}

type CharStream<'a> = Peekable<std::str::CharIndices<'a>>;

fn scan_number(chars: &mut CharStream<'_>) -> Result<Token, ConditionError> {
    let mut digits = String::new();
    let start = chars.peek().map(|&(i, _)| i).unwrap_or_default();

    if let Some(&(_, '-')) = chars.peek() {
        digits.push('-');
        chars.next();
    }
    while let Some(&(_, c)) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }

    digits.parse::<i32>().map(Token::Number).map_err(|_| {
        ConditionError::Lexing(format!(
            "invalid number \"{digits}\" at position {start}"
        ))
    })
}

fn scan_keyword(chars: &mut CharStream<'_>) -> Result<Token, ConditionError> {
    let mut word = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !(c.is_alphabetic() || c == '-' || c == '_') {
            break;
        }
        word.push(c);
        chars.next();
    }
    let word = word.to_lowercase();

    keyword(&word).ok_or_else(|| {
        ConditionError::Lexing(format!("unknown keyword \"{word}\" found in script"))
    })
}

fn scan_string(chars: &mut CharStream<'_>, start: usize) -> Result<Token, ConditionError> {
    chars.next(); // opening quote
    let mut text = String::new();
    for (_, c) in chars.by_ref() {
        if c == '"' {
            return Ok(Token::String(text));
        }
        text.push(c);
    }
    Err(ConditionError::Lexing(format!(
        "string starting at position {start} is never closed"
    )))
}

/// Second pass: merge `stat comparison number` and
/// `[has] [not] trait "..."` runs into phrase tokens.
pub fn fold_phrases(tokens: Vec<Token>) -> Result<Vec<Token>, ConditionError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter().peekable();

    while let Some(next) = tokens.next() {
        match next {
            Token::Stat(stat) => {
                let comparison = match tokens.next() {
                    Some(Token::Comparison(c)) => c,
                    other => {
                        return Err(missing(
                            "a stat comparison phrase",
                            "a comparison operator after the stat",
                            other,
                        ))
                    }
                };
                let number = match tokens.next() {
                    Some(Token::Number(n)) => n,
                    other => {
                        return Err(missing(
                            "a stat comparison phrase",
                            "a number after the comparison operator",
                            other,
                        ))
                    }
                };
                output.push(Token::Phrase(Phrase::Stat(StatPhrase {
                    stat,
                    comparison,
                    number,
                })));
            }
            Token::Has => {
                let inverse = tokens.next_if_eq(&Token::Not).is_some();
                match tokens.next() {
                    Some(Token::Trait) => {}
                    other => {
                        return Err(missing(
                            "a trait phrase",
                            "'trait' after 'has' or 'not'",
                            other,
                        ))
                    }
                }
                output.push(fold_trait_names(&mut tokens, inverse)?);
            }
            Token::Trait => output.push(fold_trait_names(&mut tokens, false)?),
            other => output.push(other),
        }
    }

    Ok(output)
}

fn fold_trait_names(
    tokens: &mut Peekable<std::vec::IntoIter<Token>>,
    inverse: bool,
) -> Result<Token, ConditionError> {
    let mut traits = Vec::new();
    while let Some(Token::String(name)) = tokens.next_if(|t| matches!(t, Token::String(_))) {
        traits.push(name);
    }
    if traits.is_empty() {
        return Err(missing(
            "a trait phrase",
            "a quoted trait name",
            tokens.next(),
        ));
    }
    Ok(Token::Phrase(Phrase::Trait(TraitPhrase { inverse, traits })))
}

fn missing(phrase: &str, expected: &str, found: Option<Token>) -> ConditionError {
    let found = match found {
        Some(token) => token.to_string(),
        None => "the end of the script".to_string(),
    };
    ConditionError::Lexing(format!(
        "found {phrase}, but it was missing {expected} (found {found})"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_symbols_and_numbers() {
        let tokens = scan("( ) , > < = != 12 -3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                Token::CloseParen,
                Token::Comma,
                Token::Comparison(Comparison::Gt),
                Token::Comparison(Comparison::Lt),
                Token::Comparison(Comparison::Eq),
                Token::Comparison(Comparison::Ne),
                Token::Number(12),
                Token::Number(-3),
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let tokens = scan("Character HAS Not Trait AND or Swagger").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Target(Target::Character),
                Token::Has,
                Token::Not,
                Token::Trait,
                Token::Bool(BoolOp::And),
                Token::Bool(BoolOp::Or),
                Token::Stat(CharacterStat::Cha),
            ]
        );
    }

    #[test]
    fn strings_keep_raw_text() {
        let tokens = scan(r#""Sworn to the \Crown""#).unwrap();
        assert_eq!(tokens, vec![Token::String(r"Sworn to the \Crown".to_string())]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(scan(r#"trait "Brave"#), Err(ConditionError::Lexing(_))));
    }

    #[test]
    fn bang_must_be_followed_by_equals() {
        assert!(matches!(scan("str ! 5"), Err(ConditionError::Lexing(_))));
        assert!(matches!(scan("str !"), Err(ConditionError::Lexing(_))));
    }

    #[test]
    fn invalid_character() {
        assert_eq!(
            scan("str > 5 & dex > 2"),
            Err(ConditionError::InvalidCharacter {
                character: '&',
                position: 8
            })
        );
    }

    #[test]
    fn unknown_keyword() {
        let err = scan("luck > 5").unwrap_err();
        assert!(err.to_string().contains("luck"));
    }

    #[test]
    fn lone_minus_is_not_a_number() {
        assert!(matches!(scan("str > -"), Err(ConditionError::Lexing(_))));
    }

    #[test]
    fn fold_stat_phrase() {
        let tokens = tokenize("strength > 10").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Phrase(Phrase::Stat(StatPhrase {
                stat: CharacterStat::Str,
                comparison: Comparison::Gt,
                number: 10,
            }))]
        );
    }

    #[test]
    fn fold_trait_phrases() {
        let tokens = tokenize(r#"character has not trait "Cursed" or trait "A" "B""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Target(Target::Character),
                Token::Phrase(Phrase::Trait(TraitPhrase {
                    inverse: true,
                    traits: vec!["Cursed".to_string()],
                })),
                Token::Bool(BoolOp::Or),
                Token::Phrase(Phrase::Trait(TraitPhrase {
                    inverse: false,
                    traits: vec!["A".to_string(), "B".to_string()],
                })),
            ]
        );
    }

    #[test]
    fn incomplete_phrases_fail() {
        assert!(matches!(tokenize("character has trait"), Err(ConditionError::Lexing(_))));
        assert!(matches!(tokenize("has \"Brave\""), Err(ConditionError::Lexing(_))));
        assert!(matches!(tokenize("str 5"), Err(ConditionError::Lexing(_))));
        assert!(matches!(tokenize("str >"), Err(ConditionError::Lexing(_))));

        let err = tokenize("dex > trait").unwrap_err();
        assert!(err.to_string().contains("number"));
    }
}
