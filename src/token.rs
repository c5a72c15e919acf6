//! The token table: keyword spellings, stable i-code ordinals, and the
//! spacing-hint sets the lister uses. Grounded on `kwtbl`/the `enum` of
//! `I_*` ids and the `i_nsa`/`i_nsb` tables in the reference `basic.c`.
//!
//! The declaration order is significant: `toktoi`/`tokenize` scans this
//! table top to bottom and takes the first full match, which is what lets a
//! short keyword like `>` sit after the longer `>=` that shares its prefix.

/// One byte, the i-code token id. Declaration order matches the reference
/// `enum` exactly so on-disk/on-wire i-code stays byte compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenId {
    Goto = 0,
    Gosub,
    Return,
    For,
    To,
    Step,
    Next,
    If,
    Rem,
    Stop,
    Input,
    Print,
    Let,
    Comma,
    Semi,
    Minus,
    Plus,
    Mul,
    Div,
    Open,
    Close,
    Gte,
    Sharp,
    Gt,
    Eq,
    Lte,
    Lt,
    Array,
    Rnd,
    Abs,
    Size,
    List,
    Run,
    New,
    System,
    Num,
    Var,
    Str,
    Eol,
}

/// Number of keyword-table entries (everything before [`TokenId::Num`]).
pub const KEYWORD_COUNT: u8 = TokenId::Num as u8;

impl TokenId {
    pub fn from_byte(b: u8) -> Option<TokenId> {
        if b <= TokenId::Eol as u8 {
            // SAFETY: repr(u8) with a contiguous, exhaustively listed
            // discriminant range checked just above.
            Some(unsafe { std::mem::transmute::<u8, TokenId>(b) })
        } else {
            None
        }
    }

    pub fn is_keyword(self) -> bool {
        (self as u8) < KEYWORD_COUNT
    }
}

/// Keyword spellings in declaration order; index == [`TokenId`] ordinal.
/// Keywords are uppercase; source matching is case-insensitive.
pub const KEYWORDS: &[&str] = &[
    "GOTO", "GOSUB", "RETURN",
    "FOR", "TO", "STEP", "NEXT",
    "IF", "REM", "STOP",
    "INPUT", "PRINT", "LET",
    ",", ";",
    "-", "+", "*", "/", "(", ")",
    ">=", "#", ">", "=", "<=", "<",
    "@", "RND", "ABS", "SIZE",
    "LIST", "RUN", "NEW", "SYSTEM",
];

const _: () = assert!(KEYWORDS.len() == KEYWORD_COUNT as usize);

/// "No space after": the lister must not emit a trailing space after these.
pub const NSA: &[TokenId] = &[
    TokenId::Return, TokenId::Stop, TokenId::Comma,
    TokenId::Minus, TokenId::Plus, TokenId::Mul, TokenId::Div, TokenId::Open, TokenId::Close,
    TokenId::Gte, TokenId::Sharp, TokenId::Gt, TokenId::Eq, TokenId::Lte, TokenId::Lt,
    TokenId::Array, TokenId::Rnd, TokenId::Abs, TokenId::Size,
];

/// "No space before" (after a numeric or variable token only).
pub const NSB: &[TokenId] = &[
    TokenId::Minus, TokenId::Plus, TokenId::Mul, TokenId::Div, TokenId::Open, TokenId::Close,
    TokenId::Gte, TokenId::Sharp, TokenId::Gt, TokenId::Eq, TokenId::Lte, TokenId::Lt,
    TokenId::Comma, TokenId::Semi, TokenId::Eol,
];

pub fn no_space_after(id: TokenId) -> bool {
    NSA.contains(&id)
}

pub fn no_space_before(id: TokenId) -> bool {
    NSB.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gte_precedes_gt_in_table() {
        let gte_idx = KEYWORDS.iter().position(|k| *k == ">=").unwrap();
        let gt_idx = KEYWORDS.iter().position(|k| *k == ">").unwrap();
        assert!(gte_idx < gt_idx);
    }

    #[test]
    fn round_trip_every_ordinal() {
        for (i, _) in KEYWORDS.iter().enumerate() {
            let id = TokenId::from_byte(i as u8).unwrap();
            assert_eq!(id as u8, i as u8);
        }
        assert_eq!(TokenId::from_byte(TokenId::Eol as u8), Some(TokenId::Eol));
    }

    #[test]
    fn keyword_count_matches_table() {
        assert_eq!(KEYWORD_COUNT as usize, 35);
    }
}
