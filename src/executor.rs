//! The statement executor: walks one line's i-code from left to right,
//! dispatching on the leading token, and the two entry points that wrap it —
//! [`Interpreter::execute_direct`] for a single typed-in command and
//! [`Interpreter::run_program`] for RUN, matching `iexe()`/`icom()`/`irun()`
//! in `basic.c`. The reference's `clp`/`cip` raw pointers into the program
//! buffer become [`Cursor`]: `clp` is `Option<usize>` (`None` for a direct
//! command, `Some(pos)` for a position inside [`crate::program_store`]) and
//! `cip` is a plain offset into an owned clone of the current line's body —
//! cloning a line (at most `SIZE_LIST` bytes, typically a handful) sidesteps
//! holding a borrow into the store across calls that also need `&mut self`
//! for RND or tracing.

use crate::config::SIZE_ARRY;
use crate::error::{ErrorKind, Result};
use crate::evaluator::{eval_expr, EvalContext};
use crate::program_store::ProgramStore;
use crate::rng::RandomSource;
use crate::stacks::{ForFrame, ForStack, GosubFrame, GosubStack, SavedPlace};
use crate::terminal::Terminal;
use crate::token::TokenId;
use crate::tracer::Tracer;

/// What happened at the end of one line's i-code.
enum Continuation {
    /// Fell through EOL of a stored-program line; resume at this position.
    Next(usize),
    /// Fell through EOL of a direct command; nothing more to do.
    DirectDone,
    /// Hit STOP.
    Stopped,
}

/// The current place in the i-code stream being executed.
struct Cursor {
    clp: Option<usize>,
    body: Vec<u8>,
    cip: usize,
}

impl Cursor {
    fn saved_place(&self) -> SavedPlace {
        match self.clp {
            Some(pos) => SavedPlace::Store(pos),
            None => SavedPlace::Direct(self.body.clone()),
        }
    }
}

/// The whole machine: variables, the array, the program store, the two
/// control stacks, and the injected terminal/RNG collaborators. Generic
/// over both so tests can swap in [`crate::terminal::ScriptedTerminal`] and
/// [`crate::rng::FixedRandomSource`] without touching the engine.
pub struct Interpreter<T: Terminal, R: RandomSource> {
    pub vars: [i16; crate::config::VAR_COUNT],
    pub array: [i16; SIZE_ARRY],
    pub store: ProgramStore,
    gosub: GosubStack,
    for_stack: ForStack,
    pub terminal: T,
    rng: R,
    pub tracer: Tracer,
    /// Where the most recently dispatched statement lived: `Some(pos)` if
    /// it was a stored-program line (whether reached via RUN or a direct
    /// command that jumped there with GOTO/GOSUB), `None` for a statement
    /// still running out of the direct-command buffer. Mirrors the
    /// reference's global `clp`, which a direct command never resets —
    /// the REPL's error report (`LINE: n ...` vs `YOU TYPE: ...`) reads
    /// this exactly the way `error()` reads `clp` there.
    last_place: Option<usize>,
}

impl<T: Terminal, R: RandomSource> Interpreter<T, R> {
    pub fn new(terminal: T, rng: R) -> Self {
        Interpreter {
            vars: [0; crate::config::VAR_COUNT],
            array: [0; SIZE_ARRY],
            store: ProgramStore::new(),
            gosub: GosubStack::new(),
            for_stack: ForStack::new(),
            terminal,
            rng,
            tracer: Tracer::new(),
            last_place: None,
        }
    }

    /// NEW: wipe variables, the array, both control stacks, and the
    /// program store. A stale GOSUB/FOR frame left over from a previous
    /// run must not survive into the next one.
    pub fn new_command(&mut self) {
        self.vars = [0; crate::config::VAR_COUNT];
        self.array = [0; SIZE_ARRY];
        self.gosub.clear();
        self.for_stack.clear();
        self.store.clear();
        self.last_place = None;
    }

    /// Where the statement that just finished (or just failed) executed,
    /// for the REPL's error report.
    pub fn last_place(&self) -> Option<usize> {
        self.last_place
    }

    fn load_store_line(&self, pos: usize) -> Cursor {
        Cursor { clp: Some(pos), body: self.store.body_at(pos).to_vec(), cip: 0 }
    }

    fn restore(&self, place: SavedPlace, cip: usize) -> Cursor {
        match place {
            SavedPlace::Direct(body) => Cursor { clp: None, body, cip },
            SavedPlace::Store(pos) => {
                let mut cursor = self.load_store_line(pos);
                cursor.cip = cip;
                cursor
            }
        }
    }

    /// Resolve a GOTO/GOSUB target line number to a store position.
    /// [`crate::program_store::TERMINATOR_LINE_NO`] can never be a legal
    /// target (no stored line carries it), so a jump that lands on the
    /// terminator is always `UndefinedLineNumber`, never an accidental hit.
    fn resolve_line(&self, target: i16) -> Result<usize> {
        if target <= 0 {
            return Err(ErrorKind::UndefinedLineNumber);
        }
        let line_no = target as u16;
        let pos = self.store.find(line_no);
        if self.store.is_terminator(pos) || self.store.line_no_at(pos) != line_no {
            return Err(ErrorKind::UndefinedLineNumber);
        }
        Ok(pos)
    }

    /// Execute one direct command (a line with no leading line number).
    /// Matches `icom()`'s single `iexe()` call: a direct GOTO/GOSUB chain
    /// runs through whichever stored lines it jumps to, but does not keep
    /// falling through into the line after the last one it touches.
    pub fn execute_direct(&mut self, body: Vec<u8>) -> Result<()> {
        let cursor = Cursor { clp: None, body, cip: 0 };
        self.run_stream(cursor)?;
        Ok(())
    }

    /// RUN: execute from the first stored line, falling through from each
    /// line to the next until STOP, the end of the store, or an error.
    /// Matches `irun()`'s outer `while(*clp)` loop around `iexe()`.
    pub fn run_program(&mut self) -> Result<()> {
        self.gosub.clear();
        self.for_stack.clear();
        let mut pos = 0;
        while !self.store.is_terminator(pos) {
            let cursor = self.load_store_line(pos);
            match self.run_stream(cursor)? {
                Continuation::Next(next_pos) => pos = next_pos,
                Continuation::Stopped => break,
                Continuation::DirectDone => unreachable!("stored-line cursor never resolves Direct"),
            }
        }
        Ok(())
    }

    /// The statement dispatch loop: runs until the cursor's line falls
    /// through EOL, STOP is hit, or an error aborts it. A GOTO/GOSUB/RETURN
    /// mid-line swaps `cur` out for a new cursor and the loop continues.
    fn run_stream(&mut self, mut cur: Cursor) -> Result<Continuation> {
        loop {
            if self.terminal.key_hit() == Some(27) {
                return Err(ErrorKind::AbortByEsc);
            }

            let tag = cur.body[cur.cip];
            let id = TokenId::from_byte(tag).ok_or(ErrorKind::SyntaxError)?;

            self.last_place = cur.clp;
            if self.tracer.is_enabled() {
                let line_no = cur.clp.map(|pos| self.store.line_no_at(pos));
                let token_name = format!("{:?}", id);
                let vars_snapshot = self.vars;
                self.tracer.record(line_no, cur.cip, &token_name, &vars_snapshot);
            }

            match id {
                TokenId::Eol => {
                    return Ok(match cur.clp {
                        Some(pos) => Continuation::Next(self.store.next_entry(pos)),
                        None => Continuation::DirectDone,
                    });
                }
                TokenId::Goto => {
                    cur.cip += 1;
                    let target = eval_expr(&cur.body, &mut cur.cip, self)?;
                    let pos = self.resolve_line(target)?;
                    cur = self.load_store_line(pos);
                }
                TokenId::Gosub => {
                    cur.cip += 1;
                    let target = eval_expr(&cur.body, &mut cur.cip, self)?;
                    let pos = self.resolve_line(target)?;
                    let frame = GosubFrame { place: cur.saved_place(), cip: cur.cip };
                    self.gosub.push(frame)?;
                    cur = self.load_store_line(pos);
                }
                TokenId::Return => {
                    let frame = self.gosub.pop()?;
                    cur = self.restore(frame.place, frame.cip);
                }
                TokenId::For => {
                    cur.cip += 1;
                    if cur.body.get(cur.cip).copied() != Some(TokenId::Var as u8) {
                        return Err(ErrorKind::ForWithoutVariable);
                    }
                    let var_index = cur.body[cur.cip + 1];
                    self.assign_var(&cur.body, &mut cur.cip)?;
                    if cur.body.get(cur.cip).copied() != Some(TokenId::To as u8) {
                        return Err(ErrorKind::ForWithoutTo);
                    }
                    cur.cip += 1;
                    let to = eval_expr(&cur.body, &mut cur.cip, self)?;
                    let step = if cur.body.get(cur.cip).copied() == Some(TokenId::Step as u8) {
                        cur.cip += 1;
                        eval_expr(&cur.body, &mut cur.cip, self)?
                    } else {
                        1
                    };
                    if (step < 0 && (-32767i16).wrapping_sub(step) > to)
                        || (step > 0 && 32767i16.wrapping_sub(step) < to)
                    {
                        return Err(ErrorKind::Overflow);
                    }
                    let place = cur.saved_place();
                    let frame = ForFrame { place, cip: cur.cip, to, step, var_index };
                    self.for_stack.push(frame)?;
                }
                TokenId::Next => {
                    cur.cip += 1;
                    let frame = self.for_stack.top()?.clone();
                    if cur.body.get(cur.cip).copied() != Some(TokenId::Var as u8) {
                        return Err(ErrorKind::NextWithoutCounter);
                    }
                    cur.cip += 1;
                    let idx = cur.body[cur.cip];
                    cur.cip += 1;
                    if idx != frame.var_index {
                        return Err(ErrorKind::NextMismatchFor);
                    }
                    let new_val = self.vars[idx as usize].wrapping_add(frame.step);
                    self.vars[idx as usize] = new_val;
                    let exhausted = (frame.step < 0 && new_val < frame.to)
                        || (frame.step > 0 && new_val > frame.to);
                    if exhausted {
                        self.for_stack.pop();
                    } else {
                        cur = self.restore(frame.place, frame.cip);
                    }
                }
                TokenId::If => {
                    cur.cip += 1;
                    let mut probe = cur.cip;
                    let condition = eval_expr(&cur.body, &mut probe, self)
                        .map_err(|_| ErrorKind::IfWithoutCondition)?;
                    cur.cip = probe;
                    if condition == 0 {
                        skip_to_eol(&cur.body, &mut cur.cip);
                    }
                }
                TokenId::Rem => {
                    skip_to_eol(&cur.body, &mut cur.cip);
                }
                TokenId::Stop => return Ok(Continuation::Stopped),
                TokenId::Var => self.assign_var(&cur.body, &mut cur.cip)?,
                TokenId::Array => self.assign_array(&cur.body, &mut cur.cip)?,
                TokenId::Let => {
                    cur.cip += 1;
                    match cur.body.get(cur.cip).copied().and_then(TokenId::from_byte) {
                        Some(TokenId::Var) => self.assign_var(&cur.body, &mut cur.cip)?,
                        Some(TokenId::Array) => self.assign_array(&cur.body, &mut cur.cip)?,
                        _ => return Err(ErrorKind::LetWithoutVariable),
                    }
                }
                TokenId::Print => self.exec_print(&mut cur)?,
                TokenId::Input => self.exec_input(&mut cur)?,
                TokenId::Semi => {
                    cur.cip += 1;
                }
                TokenId::List | TokenId::Run | TokenId::New | TokenId::System => {
                    return Err(ErrorKind::IllegalCommand);
                }
                _ => return Err(ErrorKind::SyntaxError),
            }
        }
    }

    /// Assumes `body[*cip]` is the VAR tag; consumes `VAR idx EQ expr` and
    /// stores the result. Shared by top-level `VAR = expr`, `LET VAR =
    /// expr`, and the assignment half of `FOR`.
    fn assign_var(&mut self, body: &[u8], cip: &mut usize) -> Result<()> {
        *cip += 1;
        let idx = body[*cip];
        *cip += 1;
        if body.get(*cip).copied() != Some(TokenId::Eq as u8) {
            return Err(ErrorKind::EqExpected);
        }
        *cip += 1;
        let value = eval_expr(body, cip, self)?;
        self.vars[idx as usize] = value;
        Ok(())
    }

    /// Assumes `body[*cip]` is the ARRAY tag; consumes `ARRAY ( expr ) EQ
    /// expr` and stores the result. Shared by top-level `@(expr) = expr`
    /// and `LET @(expr) = expr`.
    fn assign_array(&mut self, body: &[u8], cip: &mut usize) -> Result<()> {
        *cip += 1;
        if body.get(*cip).copied() != Some(TokenId::Open as u8) {
            return Err(ErrorKind::ParenExpected);
        }
        *cip += 1;
        let index = eval_expr(body, cip, self)?;
        if body.get(*cip).copied() != Some(TokenId::Close as u8) {
            return Err(ErrorKind::ParenExpected);
        }
        *cip += 1;
        if !(0..SIZE_ARRY as i16).contains(&index) {
            return Err(ErrorKind::SubscriptOutOfRange);
        }
        if body.get(*cip).copied() != Some(TokenId::Eq as u8) {
            return Err(ErrorKind::EqExpected);
        }
        *cip += 1;
        let value = eval_expr(body, cip, self)?;
        self.array[index as usize] = value;
        Ok(())
    }

    fn print_num(&mut self, value: i16, field_width: i16) {
        let text = value.to_string();
        let pad = (field_width.max(0) as usize).saturating_sub(text.len());
        for _ in 0..pad {
            self.terminal.put_char(b' ');
        }
        self.terminal.put_str(&text);
    }

    /// `PRINT (STR | SHARP expr | expr) (COMMA (STR | SHARP expr | expr))*
    /// SEMI?`. Commas separate items with no extra output; a trailing SEMI
    /// suppresses the newline that otherwise follows the list.
    fn exec_print(&mut self, cur: &mut Cursor) -> Result<()> {
        cur.cip += 1;
        let mut field_width: i16 = 0;
        loop {
            let tag = cur.body[cur.cip];
            if tag == TokenId::Semi as u8 || tag == TokenId::Eol as u8 {
                break;
            }
            match TokenId::from_byte(tag) {
                Some(TokenId::Str) => {
                    cur.cip += 1;
                    let len = cur.body[cur.cip] as usize;
                    cur.cip += 1;
                    let payload = cur.body[cur.cip..cur.cip + len].to_vec();
                    self.terminal.put_str(&String::from_utf8_lossy(&payload));
                    cur.cip += len;
                }
                Some(TokenId::Sharp) => {
                    cur.cip += 1;
                    field_width = eval_expr(&cur.body, &mut cur.cip, self)?;
                }
                _ => {
                    let value = eval_expr(&cur.body, &mut cur.cip, self)?;
                    self.print_num(value, field_width);
                }
            }
            if cur.body.get(cur.cip).copied() == Some(TokenId::Comma as u8) {
                cur.cip += 1;
            } else if cur.body.get(cur.cip).copied() != Some(TokenId::Semi as u8)
                && cur.body.get(cur.cip).copied() != Some(TokenId::Eol as u8)
            {
                return Err(ErrorKind::SyntaxError);
            }
        }
        if cur.body.get(cur.cip).copied() == Some(TokenId::Semi as u8) {
            cur.cip += 1;
        } else {
            self.terminal.newline();
        }
        Ok(())
    }

    /// `INPUT (STR? VAR | STR? ARRAY OPEN expr CLOSE) (COMMA same)* SEMI?`.
    /// Each target prompts (a caller-supplied string, or else `<LETTER>:`
    /// / `@(<index>):`) and reads up to six characters (sign plus up to
    /// five digits).
    fn exec_input(&mut self, cur: &mut Cursor) -> Result<()> {
        cur.cip += 1;
        loop {
            let mut custom_prompt = false;
            if cur.body.get(cur.cip).copied() == Some(TokenId::Str as u8) {
                cur.cip += 1;
                let len = cur.body[cur.cip] as usize;
                cur.cip += 1;
                let payload = cur.body[cur.cip..cur.cip + len].to_vec();
                self.terminal.put_str(&String::from_utf8_lossy(&payload));
                cur.cip += len;
                custom_prompt = true;
            }
            match cur.body.get(cur.cip).copied().and_then(TokenId::from_byte) {
                Some(TokenId::Var) => {
                    cur.cip += 1;
                    let idx = cur.body[cur.cip];
                    cur.cip += 1;
                    if !custom_prompt {
                        self.terminal.put_char(b'A' + idx);
                        self.terminal.put_char(b':');
                    }
                    let value = self.read_num()?;
                    self.vars[idx as usize] = value;
                }
                Some(TokenId::Array) => {
                    cur.cip += 1;
                    if cur.body.get(cur.cip).copied() != Some(TokenId::Open as u8) {
                        return Err(ErrorKind::ParenExpected);
                    }
                    cur.cip += 1;
                    let index = eval_expr(&cur.body, &mut cur.cip, self)?;
                    if cur.body.get(cur.cip).copied() != Some(TokenId::Close as u8) {
                        return Err(ErrorKind::ParenExpected);
                    }
                    cur.cip += 1;
                    if !(0..SIZE_ARRY as i16).contains(&index) {
                        return Err(ErrorKind::SubscriptOutOfRange);
                    }
                    if !custom_prompt {
                        self.terminal.put_str(&format!("@({}):", index));
                    }
                    let value = self.read_num()?;
                    self.array[index as usize] = value;
                }
                _ => return Err(ErrorKind::SyntaxError),
            }
            match cur.body.get(cur.cip).copied().and_then(TokenId::from_byte) {
                Some(TokenId::Comma) => cur.cip += 1,
                Some(TokenId::Semi) | Some(TokenId::Eol) => {
                    cur.cip += 1;
                    break;
                }
                _ => return Err(ErrorKind::SyntaxError),
            }
        }
        Ok(())
    }

    /// Reads one answer character at a time: BS/DEL erase, a leading sign
    /// is accepted only as the first character, digits accepted up to a
    /// six-character total (sign plus five digits), matching `c_gets`'s
    /// trim loop and `getnum`'s accumulation limit in the reference.
    fn read_num(&mut self) -> Result<i16> {
        let mut buf = String::new();
        loop {
            let c = self.terminal.get_char();
            if c == b'\n' || c == b'\r' {
                break;
            }
            if (c == 8 || c == 127) && !buf.is_empty() {
                buf.pop();
                self.terminal.put_str("\u{8} \u{8}");
                continue;
            }
            let can_sign = buf.is_empty() && (c == b'+' || c == b'-');
            let can_digit = buf.len() < 6 && c.is_ascii_digit();
            if can_sign || can_digit {
                buf.push(c as char);
                self.terminal.put_char(c);
            }
        }
        self.terminal.newline();
        parse_signed_checked(&buf)
    }
}

/// Advance `cip` past the rest of the current statement stream up to (but
/// not including) EOL, walking payload-bearing tokens by their actual
/// length rather than scanning raw bytes for a byte matching EOL's ordinal
/// (a string payload could coincidentally contain that byte). Shared by
/// REM and a false IF condition.
fn skip_to_eol(body: &[u8], cip: &mut usize) {
    loop {
        let tag = body[*cip];
        if tag == TokenId::Eol as u8 {
            return;
        }
        match TokenId::from_byte(tag) {
            Some(TokenId::Num) => *cip += 3,
            Some(TokenId::Var) => *cip += 2,
            Some(TokenId::Str) | Some(TokenId::Rem) => {
                let len = body[*cip + 1] as usize;
                *cip += 2 + len;
            }
            _ => *cip += 1,
        }
    }
}

/// Parse an optional sign followed by digits into a wrapping-checked
/// `i16`, the same overflow idiom the tokenizer uses for numeric literals
/// (see `tokenizer::tokenize`), applied here to INPUT's typed answer.
fn parse_signed_checked(buf: &str) -> Result<i16> {
    let bytes = buf.as_bytes();
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    let mut value: i16 = 0;
    for &d in digits {
        let digit = (d - b'0') as i16;
        let next = value.wrapping_mul(10).wrapping_add(digit);
        if value > next {
            return Err(ErrorKind::Overflow);
        }
        value = next;
    }
    Ok(if negative { 0i16.wrapping_sub(value) } else { value })
}

impl<T: Terminal, R: RandomSource> EvalContext for Interpreter<T, R> {
    fn var(&self, idx: u8) -> i16 {
        self.vars[idx as usize]
    }

    fn array_get(&self, index: i16) -> Result<i16> {
        if !(0..SIZE_ARRY as i16).contains(&index) {
            return Err(ErrorKind::SubscriptOutOfRange);
        }
        Ok(self.array[index as usize])
    }

    fn free_size(&self) -> i16 {
        self.store.free_size() as i16
    }

    fn rnd(&mut self, bound: i16) -> Result<i16> {
        if bound <= 0 {
            return Err(ErrorKind::SubscriptOutOfRange);
        }
        let raw = self.rng.rand16();
        Ok((raw % bound as u16) as i16 + 1)
    }
}
