/// Expression builder — phrase tokens → expression tree.
///
/// A shunting-yard pass orders the tokens into postfix form, then a
/// stack pass assembles the tree. Targets behave like prefix operators
/// that swallow everything up to the end of their clause.

use crate::core::lexer::{tokenize, BoolOp, ConditionError, Phrase, Target, Token};

/// A node of a parsed condition. Each node owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionNode {
    Phrase(Phrase),
    Bool {
        op: BoolOp,
        lhs: Box<ExpressionNode>,
        rhs: Box<ExpressionNode>,
    },
    Target {
        scope: Target,
        inner: Box<ExpressionNode>,
    },
}

/// A fully built condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionTree {
    pub root: ExpressionNode,
}

impl ConditionTree {
    /// Lex and build a condition script.
    pub fn parse(script: &str) -> Result<ConditionTree, ConditionError> {
        let tokens = tokenize(script)?;
        Self::from_tokens(tokens)
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Result<ConditionTree, ConditionError> {
        Ok(ConditionTree {
            root: build(tokens)?,
        })
    }
}

/// Entries that may wait on the operator stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Target(Target),
    OpenParen,
    Bool(BoolOp),
}

/// Entries of the postfix output queue.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Postfix {
    Phrase(Phrase),
    Bool(BoolOp),
    Target(Target),
}

/// Build an expression tree from folded tokens.
pub fn build(tokens: Vec<Token>) -> Result<ExpressionNode, ConditionError> {
    let postfix = to_postfix(tokens)?;
    let root = assemble(postfix)?;
    check_scopes(&root, None)?;
    Ok(root)
}

fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Postfix>, ConditionError> {
    let mut output = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();

    for token in tokens {
        match token {
            Token::Phrase(phrase) => output.push(Postfix::Phrase(phrase)),
            Token::Target(target) => operators.push(Operator::Target(target)),
            Token::OpenParen => operators.push(Operator::OpenParen),
            Token::Bool(op) => push_bool(op, &mut operators, &mut output),
            Token::Comma => {
                // Close the innermost target clause...
                loop {
                    match operators.pop() {
                        Some(Operator::Bool(op)) => output.push(Postfix::Bool(op)),
                        Some(Operator::Target(target)) => {
                            output.push(Postfix::Target(target));
                            break;
                        }
                        Some(Operator::OpenParen) | None => {
                            return Err(ConditionError::Lexing(
                                "the condition contained a comma without a matching target"
                                    .to_string(),
                            ))
                        }
                    }
                }
                // ...and join it to the next one.
                push_bool(BoolOp::And, &mut operators, &mut output);
            }
            Token::CloseParen => loop {
                match operators.pop() {
                    Some(Operator::OpenParen) => break,
                    Some(Operator::Bool(op)) => output.push(Postfix::Bool(op)),
                    Some(Operator::Target(target)) => output.push(Postfix::Target(target)),
                    None => {
                        return Err(ConditionError::Lexing(
                            "the condition contained a mismatched closing parenthesis".to_string(),
                        ))
                    }
                }
            },
            other => {
                return Err(ConditionError::Lexing(format!(
                    "unexpected {other} in condition"
                )))
            }
        }
    }

    while let Some(operator) = operators.pop() {
        match operator {
            Operator::Bool(op) => output.push(Postfix::Bool(op)),
            Operator::Target(target) => output.push(Postfix::Target(target)),
            Operator::OpenParen => {
                return Err(ConditionError::Lexing(
                    "the condition contained an unclosed opening parenthesis".to_string(),
                ))
            }
        }
    }

    Ok(output)
}

fn push_bool(op: BoolOp, operators: &mut Vec<Operator>, output: &mut Vec<Postfix>) {
    while let Some(&Operator::Bool(top)) = operators.last() {
        if !should_unstack(op, top) {
            break;
        }
        operators.pop();
        output.push(Postfix::Bool(top));
    }
    operators.push(Operator::Bool(op));
}

/// Only two operators exist, so instead of a precedence table: everything
/// yields to an incoming operator except an OR waiting under an AND.
fn should_unstack(incoming: BoolOp, top: BoolOp) -> bool {
    !(incoming == BoolOp::And && top == BoolOp::Or)
}

/// Deepest expression nesting a condition may build to. Evaluation,
/// scope checking and dropping all recurse once per level.
pub const MAX_DEPTH: usize = 256;

fn assemble(postfix: Vec<Postfix>) -> Result<ExpressionNode, ConditionError> {
    // Each entry carries the depth of the subtree it roots.
    let mut stack: Vec<(ExpressionNode, usize)> = Vec::new();

    for item in postfix {
        let entry = match item {
            Postfix::Phrase(phrase) => (ExpressionNode::Phrase(phrase), 1),
            Postfix::Bool(op) => {
                let ((rhs, rhs_depth), (lhs, lhs_depth)) = match (stack.pop(), stack.pop()) {
                    (Some(rhs), Some(lhs)) => (rhs, lhs),
                    _ => {
                        let word = if op == BoolOp::And { "and" } else { "or" };
                        return Err(ConditionError::Lexing(format!(
                            "'{word}' is missing an expression on one of its sides"
                        )));
                    }
                };
                let node = ExpressionNode::Bool {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                (node, lhs_depth.max(rhs_depth) + 1)
            }
            Postfix::Target(scope) => {
                let (inner, depth) = stack.pop().ok_or_else(|| {
                    ConditionError::Lexing(format!(
                        "target '{}' is not followed by anything to test",
                        scope.keyword()
                    ))
                })?;
                let node = ExpressionNode::Target {
                    scope,
                    inner: Box::new(inner),
                };
                (node, depth + 1)
            }
        };
        if entry.1 > MAX_DEPTH {
            return Err(ConditionError::Lexing(format!(
                "the condition nests deeper than {MAX_DEPTH} levels"
            )));
        }
        stack.push(entry);
    }

    let (root, _) = stack.pop().ok_or_else(|| {
        ConditionError::Lexing("the condition does not contain any phrase".to_string())
    })?;
    if !stack.is_empty() {
        return Err(ConditionError::Lexing(
            "the condition contains expressions that are not joined by 'and' or 'or'".to_string(),
        ));
    }
    Ok(root)
}

/// Stat phrases only make sense for characters or the party.
fn check_scopes(node: &ExpressionNode, scope: Option<Target>) -> Result<(), ConditionError> {
    match node {
        ExpressionNode::Phrase(Phrase::Stat(phrase)) => match scope {
            Some(target @ (Target::Encounter | Target::Session)) => {
                Err(ConditionError::Lexing(format!(
                    "stat check on {} cannot be used under the '{}' target",
                    phrase.stat,
                    target.keyword()
                )))
            }
            _ => Ok(()),
        },
        ExpressionNode::Phrase(Phrase::Trait(_)) => Ok(()),
        ExpressionNode::Bool { lhs, rhs, .. } => {
            check_scopes(lhs, scope)?;
            check_scopes(rhs, scope)
        }
        ExpressionNode::Target { scope, inner } => check_scopes(inner, Some(*scope)),
    }
}
