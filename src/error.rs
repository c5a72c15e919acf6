//! The interpreter's categorical error kind.
//!
//! Every layer (tokenizer, program store, evaluator, executor, REPL) reports
//! failure as one of these variants and nothing else — there is no
//! dynamic-message wrapping, because the message set is closed and fixed.
//! The REPL is the single place that clears an error after reporting it.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ErrorKind>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Overflow")]
    Overflow,
    #[error("Subscript out of range")]
    SubscriptOutOfRange,
    #[error("Icode buffer full")]
    IcodeBufferFull,
    #[error("List full")]
    ListFull,
    #[error("GOSUB too many nested")]
    GosubTooManyNested,
    #[error("RETURN stack underflow")]
    ReturnStackUnderflow,
    #[error("FOR too many nested")]
    ForTooManyNested,
    #[error("NEXT without FOR")]
    NextWithoutFor,
    #[error("NEXT without counter")]
    NextWithoutCounter,
    #[error("NEXT mismatch FOR")]
    NextMismatchFor,
    #[error("FOR without variable")]
    ForWithoutVariable,
    #[error("FOR without TO")]
    ForWithoutTo,
    #[error("LET without variable")]
    LetWithoutVariable,
    #[error("IF without condition")]
    IfWithoutCondition,
    #[error("Undefined line number")]
    UndefinedLineNumber,
    #[error("'(' or ')' expected")]
    ParenExpected,
    #[error("'=' expected")]
    EqExpected,
    #[error("Illegal command")]
    IllegalCommand,
    #[error("Syntax error")]
    SyntaxError,
    #[error("Internal error")]
    InternalError,
    #[error("Abort by [ESC]")]
    AbortByEsc,
}

/// The banner line the REPL prints after a command completes without error.
pub const OK: &str = "OK";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_reference_table() {
        assert_eq!(ErrorKind::DivisionByZero.to_string(), "Division by zero");
        assert_eq!(ErrorKind::ParenExpected.to_string(), "'(' or ')' expected");
        assert_eq!(ErrorKind::EqExpected.to_string(), "'=' expected");
        assert_eq!(ErrorKind::AbortByEsc.to_string(), "Abort by [ESC]");
    }
}
