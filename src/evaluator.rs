//! The expression evaluator: a recursive-descent, precedence-climbing
//! parser running directly over the i-code byte stream, producing signed
//! 16-bit values. Grounded on `ivalue()`/`imul()`/`iplus()`/`iexp()`/
//! `getparam()` in `basic.c`, generalized from the reference's
//! wrapping-hardware-int semantics to explicit `i16::wrapping_*` calls.

use crate::error::{ErrorKind, Result};
use crate::token::TokenId;

/// Everything the evaluator needs from the surrounding machine: variable
/// and array storage, the random source, and the program store's free
/// space (for the `SIZE` builtin).
pub trait EvalContext {
    fn var(&self, idx: u8) -> i16;
    fn array_get(&self, index: i16) -> Result<i16>;
    fn free_size(&self) -> i16;
    fn rnd(&mut self, bound: i16) -> Result<i16>;
}

/// `grammar: value := NUM | VAR | PLUS value | MINUS value | OPEN expr CLOSE
///                   | ARRAY OPEN expr CLOSE | RND OPEN expr CLOSE
///                   | ABS OPEN expr CLOSE | SIZE OPEN CLOSE`
fn eval_value(body: &[u8], pos: &mut usize, ctx: &mut dyn EvalContext) -> Result<i16> {
    let tag = TokenId::from_byte(body[*pos]).ok_or(ErrorKind::SyntaxError)?;
    match tag {
        TokenId::Num => {
            let value = i16::from_le_bytes([body[*pos + 1], body[*pos + 2]]);
            *pos += 3;
            Ok(value)
        }
        TokenId::Var => {
            let idx = body[*pos + 1];
            *pos += 2;
            Ok(ctx.var(idx))
        }
        TokenId::Plus => {
            *pos += 1;
            eval_value(body, pos, ctx)
        }
        TokenId::Minus => {
            *pos += 1;
            Ok(0i16.wrapping_sub(eval_value(body, pos, ctx)?))
        }
        TokenId::Open => get_param_body(body, pos, ctx),
        TokenId::Array => {
            *pos += 1;
            let index = get_param(body, pos, ctx)?;
            if !(0..(crate::config::SIZE_ARRY as i16)).contains(&index) {
                return Err(ErrorKind::SubscriptOutOfRange);
            }
            ctx.array_get(index)
        }
        TokenId::Rnd => {
            *pos += 1;
            let bound = get_param(body, pos, ctx)?;
            ctx.rnd(bound)
        }
        TokenId::Abs => {
            *pos += 1;
            let value = get_param(body, pos, ctx)?;
            Ok(value.wrapping_abs())
        }
        TokenId::Size => {
            *pos += 1;
            if body[*pos] != TokenId::Open as u8 || body[*pos + 1] != TokenId::Close as u8 {
                return Err(ErrorKind::ParenExpected);
            }
            *pos += 2;
            Ok(ctx.free_size())
        }
        _ => Err(ErrorKind::SyntaxError),
    }
}

/// Consume `(` expr `)` where the opening paren has already been
/// recognized but not yet consumed.
fn get_param_body(body: &[u8], pos: &mut usize, ctx: &mut dyn EvalContext) -> Result<i16> {
    if body[*pos] != TokenId::Open as u8 {
        return Err(ErrorKind::ParenExpected);
    }
    *pos += 1;
    let value = eval_expr(body, pos, ctx)?;
    if body[*pos] != TokenId::Close as u8 {
        return Err(ErrorKind::ParenExpected);
    }
    *pos += 1;
    Ok(value)
}

fn get_param(body: &[u8], pos: &mut usize, ctx: &mut dyn EvalContext) -> Result<i16> {
    get_param_body(body, pos, ctx)
}

fn eval_mul(body: &[u8], pos: &mut usize, ctx: &mut dyn EvalContext) -> Result<i16> {
    let mut value = eval_value(body, pos, ctx)?;
    loop {
        match TokenId::from_byte(body[*pos]) {
            Some(TokenId::Mul) => {
                *pos += 1;
                let rhs = eval_value(body, pos, ctx)?;
                value = value.wrapping_mul(rhs);
            }
            Some(TokenId::Div) => {
                *pos += 1;
                let rhs = eval_value(body, pos, ctx)?;
                if rhs == 0 {
                    return Err(ErrorKind::DivisionByZero);
                }
                value = value.wrapping_div(rhs);
            }
            _ => return Ok(value),
        }
    }
}

fn eval_add(body: &[u8], pos: &mut usize, ctx: &mut dyn EvalContext) -> Result<i16> {
    let mut value = eval_mul(body, pos, ctx)?;
    loop {
        match TokenId::from_byte(body[*pos]) {
            Some(TokenId::Plus) => {
                *pos += 1;
                let rhs = eval_mul(body, pos, ctx)?;
                value = value.wrapping_add(rhs);
            }
            Some(TokenId::Minus) => {
                *pos += 1;
                let rhs = eval_mul(body, pos, ctx)?;
                value = value.wrapping_sub(rhs);
            }
            _ => return Ok(value),
        }
    }
}

/// `expr := addExpr ( relOp addExpr )*`, left-folding — chained comparisons
/// like `A<B<C` deliberately mean `(A<B)<C`, not a range test.
pub fn eval_expr(body: &[u8], pos: &mut usize, ctx: &mut dyn EvalContext) -> Result<i16> {
    let mut value = eval_add(body, pos, ctx)?;
    loop {
        let op = TokenId::from_byte(body[*pos]);
        let relation: fn(i16, i16) -> bool = match op {
            Some(TokenId::Eq) => |a, b| a == b,
            Some(TokenId::Sharp) => |a, b| a != b,
            Some(TokenId::Lt) => |a, b| a < b,
            Some(TokenId::Lte) => |a, b| a <= b,
            Some(TokenId::Gt) => |a, b| a > b,
            Some(TokenId::Gte) => |a, b| a >= b,
            _ => return Ok(value),
        };
        *pos += 1;
        let rhs = eval_add(body, pos, ctx)?;
        value = relation(value, rhs) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    struct Ctx {
        vars: [i16; 26],
        arr: [i16; 64],
        free: i16,
        next_rnd: i16,
    }

    impl EvalContext for Ctx {
        fn var(&self, idx: u8) -> i16 {
            self.vars[idx as usize]
        }
        fn array_get(&self, index: i16) -> Result<i16> {
            Ok(self.arr[index as usize])
        }
        fn free_size(&self) -> i16 {
            self.free
        }
        fn rnd(&mut self, bound: i16) -> Result<i16> {
            if bound <= 0 {
                return Err(ErrorKind::SubscriptOutOfRange);
            }
            Ok((self.next_rnd % bound) + 1)
        }
    }

    fn ctx() -> Ctx {
        Ctx { vars: [0; 26], arr: [0; 64], free: 900, next_rnd: 0 }
    }

    fn eval(source: &str, c: &mut Ctx) -> Result<i16> {
        let body = tokenize(source).unwrap();
        let mut pos = 0;
        eval_expr(&body, &mut pos, c)
    }

    #[test]
    fn precedence_is_standard() {
        assert_eq!(eval("1+2*3", &mut ctx()).unwrap(), 7);
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(eval("7/2", &mut ctx()).unwrap(), 3);
        assert_eq!(eval("-7/2", &mut ctx()).unwrap(), -3);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(eval("1/0", &mut ctx()).unwrap_err(), ErrorKind::DivisionByZero);
    }

    #[test]
    fn chained_relations_fold_left() {
        // (1<2) < 3  ==  1 < 3  ==  1
        assert_eq!(eval("1<2<3", &mut ctx()).unwrap(), 1);
    }

    #[test]
    fn unary_minus_and_plus_chain() {
        assert_eq!(eval("--5", &mut ctx()).unwrap(), 5);
        assert_eq!(eval("+-5", &mut ctx()).unwrap(), -5);
    }

    #[test]
    fn multiplication_wraps_on_overflow() {
        assert_eq!(eval("200*200", &mut ctx()).unwrap(), 200i16.wrapping_mul(200));
    }

    #[test]
    fn array_bounds_are_checked_both_sides() {
        let mut c = ctx();
        assert_eq!(eval("@(64)", &mut c).unwrap_err(), ErrorKind::SubscriptOutOfRange);
        assert_eq!(eval("@(-1)", &mut c).unwrap_err(), ErrorKind::SubscriptOutOfRange);
        assert!(eval("@(63)", &mut c).is_ok());
    }

    #[test]
    fn size_builtin_reads_context() {
        let mut c = ctx();
        c.free = 512;
        assert_eq!(eval("SIZE()", &mut c).unwrap(), 512);
    }

    #[test]
    fn rnd_rejects_non_positive_bound() {
        let mut c = ctx();
        assert_eq!(eval("RND(0)", &mut c).unwrap_err(), ErrorKind::SubscriptOutOfRange);
    }
}
