//! Conditional guard evaluation

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConditionError {
    #[error("unsupported expression {0:?}")]
    Unsupported(String),

    #[error("unterminated quote in {0:?}")]
    UnterminatedQuote(String),
}

/// Decides whether a step's `if:` expression holds
pub trait ConditionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str) -> Result<bool, ConditionError>;
}

/// Evaluator for `true`, `false`, `a == b` and `a != b`, combined with
/// `&&` and `||` (`&&` binds tighter). Operands may be quoted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonEvaluator;

impl ConditionEvaluator for ComparisonEvaluator {
    fn evaluate(&self, expression: &str) -> Result<bool, ConditionError> {
        for disjunct in split_outside_quotes(expression, "||")? {
            let mut all = true;
            for term in split_outside_quotes(disjunct, "&&")? {
                if !evaluate_term(term)? {
                    all = false;
                    break;
                }
            }
            if all {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn evaluate_term(term: &str) -> Result<bool, ConditionError> {
    let term = term.trim();
    match term {
        "true" => return Ok(true),
        "false" => return Ok(false),
        _ => {}
    }

    for (op, equal) in [("!=", false), ("==", true)] {
        let parts = split_outside_quotes(term, op)?;
        if parts.len() == 2 {
            let lhs = unquote(parts[0])?;
            let rhs = unquote(parts[1])?;
            return Ok((lhs == rhs) == equal);
        }
    }

    Err(ConditionError::Unsupported(term.to_string()))
}

fn unquote(operand: &str) -> Result<&str, ConditionError> {
    let operand = operand.trim();
    for quote in ['\'', '"'] {
        if let Some(rest) = operand.strip_prefix(quote) {
            return rest
                .strip_suffix(quote)
                .ok_or_else(|| ConditionError::UnterminatedQuote(operand.to_string()));
        }
    }
    Ok(operand)
}

/// Split on `sep`, ignoring occurrences inside single or double quotes
fn split_outside_quotes<'a>(input: &'a str, sep: &str) -> Result<Vec<&'a str>, ConditionError> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut iter = input.char_indices();

    while let Some((i, c)) = iter.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if input[i..].starts_with(sep) => {
                parts.push(&input[start..i]);
                start = i + sep.len();
                for _ in 1..sep.len() {
                    iter.next();
                }
            }
            None => {}
        }
    }

    if quote.is_some() {
        return Err(ConditionError::UnterminatedQuote(input.to_string()));
    }
    parts.push(&input[start..]);
    Ok(parts)
}
