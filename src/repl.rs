//! The REPL driver: prompt, read, tokenize, and dispatch to either the
//! program store (a leading NUM), a top-level command (NEW/LIST/RUN), or
//! direct execution, then report OK or an error. Grounded on `basic()`,
//! `icom()`, `ilist()`, and `error()` in `basic.c`.

use crate::error::{ErrorKind, Result};
use crate::executor::Interpreter;
use crate::lister::list_body;
use crate::rng::RandomSource;
use crate::terminal::Terminal;
use crate::token::TokenId;
use crate::tokenizer::tokenize;

/// The edition string the reference's `STR_EDITION` names the porting
/// target with (`"LINUX"` there); this port's banner says `RUST`.
const EDITION: &str = "RUST";

pub struct Repl<T: Terminal, R: RandomSource> {
    pub interp: Interpreter<T, R>,
}

impl<T: Terminal, R: RandomSource> Repl<T, R> {
    pub fn new(terminal: T, rng: R) -> Self {
        let mut interp = Interpreter::new(terminal, rng);
        interp.new_command();
        Repl { interp }
    }

    /// `TOYOSHIKI TINY BASIC\n<EDITION> EDITION\n\nOK\n`.
    pub fn print_banner(&mut self) {
        self.interp.terminal.put_str("TOYOSHIKI TINY BASIC");
        self.interp.terminal.newline();
        self.interp.terminal.put_str(EDITION);
        self.interp.terminal.put_str(" EDITION");
        self.interp.terminal.newline();
        self.interp.terminal.newline();
        self.interp.terminal.put_str(crate::error::OK);
        self.interp.terminal.newline();
    }

    /// Preload a program, one source line per string, as if it had been
    /// typed at the prompt with no reporting on success (mirroring the
    /// spec's step 5: a numbered line that tokenizes and inserts cleanly
    /// produces no output). Used by `main.rs` to load a file named on the
    /// command line before entering the interactive loop.
    pub fn load_line(&mut self, raw: &str) {
        let trimmed = raw.trim_end();
        if trimmed.is_empty() {
            return;
        }
        match tokenize(trimmed) {
            Ok(mut body) if body.first().copied() == Some(TokenId::Num as u8) => {
                body[0] = body.len() as u8;
                let _ = self.interp.store.insert(&body);
            }
            _ => {}
        }
    }

    /// Run one prompt/read/dispatch/report cycle. Returns `false` once
    /// SYSTEM has been entered, signalling the caller to stop looping.
    pub fn step(&mut self) -> bool {
        self.interp.terminal.put_char(b'>');
        let raw = self.interp.terminal.read_line();
        let trimmed = raw.trim_end().to_string();

        let body = match tokenize(&trimmed) {
            Ok(body) => body,
            Err(e) => {
                self.report_you_type(e, &trimmed);
                return true;
            }
        };

        if body.first().copied() == Some(TokenId::System as u8) {
            return false;
        }

        if body.first().copied() == Some(TokenId::Num as u8) {
            let mut entry = body;
            entry[0] = entry.len() as u8;
            if let Err(e) = self.interp.store.insert(&entry) {
                self.report_you_type(e, &trimmed);
            }
            return true;
        }

        let result = self.dispatch(&body);
        self.report_after_exec(result, &trimmed);
        true
    }

    /// Prompt in a loop until SYSTEM.
    pub fn run(&mut self) {
        self.print_banner();
        while self.step() {}
    }

    /// NEW/LIST/RUN are recognized only as the entire line's leading
    /// token (`icom()`'s own switch); anything else — including NEW/LIST/
    /// RUN appearing after a leading statement — falls to direct
    /// execution, where the executor itself rejects them as
    /// `IllegalCommand`.
    fn dispatch(&mut self, body: &[u8]) -> Result<()> {
        match body.first().copied().and_then(TokenId::from_byte) {
            Some(TokenId::New) => {
                if body.get(1).copied() != Some(TokenId::Eol as u8) {
                    return Err(ErrorKind::SyntaxError);
                }
                self.interp.new_command();
                Ok(())
            }
            Some(TokenId::List) => self.exec_list(body),
            Some(TokenId::Run) => self.interp.run_program(),
            _ => self.interp.execute_direct(body.to_vec()),
        }
    }

    /// `LIST` (all lines) or `LIST <lineNo>` (from that line onward); any
    /// other trailing tokens are a syntax error. Matches `ilist()`'s
    /// acceptance of `I_EOL` or a bare `NUM` immediately before `I_EOL`.
    fn exec_list(&mut self, body: &[u8]) -> Result<()> {
        let start_line: u16 = if body.get(1).copied() == Some(TokenId::Eol as u8) {
            0
        } else if body.get(1).copied() == Some(TokenId::Num as u8)
            && body.get(4).copied() == Some(TokenId::Eol as u8)
        {
            u16::from_le_bytes([body[2], body[3]])
        } else {
            return Err(ErrorKind::SyntaxError);
        };

        let mut pos = self.interp.store.find(start_line);
        while !self.interp.store.is_terminator(pos) {
            let line_no = self.interp.store.line_no_at(pos);
            self.interp.terminal.put_str(&line_no.to_string());
            self.interp.terminal.put_char(b' ');
            let listing = list_body(self.interp.store.body_at(pos))?;
            self.interp.terminal.put_str(&listing);
            self.interp.terminal.newline();
            pos = self.interp.store.next_entry(pos);
        }
        Ok(())
    }

    /// Step 3/5 error report: tokenize and program-store-insert failures
    /// never involve an execution cursor, so they always read back the
    /// raw typed line, never a stored line's listing.
    fn report_you_type(&mut self, err: ErrorKind, raw: &str) {
        self.interp.terminal.newline();
        self.interp.terminal.put_str("YOU TYPE: ");
        self.interp.terminal.put_str(raw);
        self.interp.terminal.newline();
        self.interp.terminal.put_str(&err.to_string());
        self.interp.terminal.newline();
    }

    /// Step 6 report: OK on success; on failure, `LINE: <n> <listing>` if
    /// the statement that failed belonged to a stored program line
    /// (whether reached via RUN or a direct GOTO/GOSUB), else `YOU TYPE:
    /// <rawLine>`.
    fn report_after_exec(&mut self, result: Result<()>, raw: &str) {
        match result {
            Ok(()) => {
                self.interp.terminal.newline();
                self.interp.terminal.put_str(crate::error::OK);
                self.interp.terminal.newline();
            }
            Err(e) => {
                self.interp.terminal.newline();
                match self.interp.last_place() {
                    Some(pos) => {
                        let line_no = self.interp.store.line_no_at(pos);
                        self.interp.terminal.put_str("LINE:");
                        self.interp.terminal.put_str(&line_no.to_string());
                        self.interp.terminal.put_char(b' ');
                        let listing =
                            list_body(self.interp.store.body_at(pos)).unwrap_or_default();
                        self.interp.terminal.put_str(&listing);
                    }
                    None => {
                        self.interp.terminal.put_str("YOU TYPE: ");
                        self.interp.terminal.put_str(raw);
                    }
                }
                self.interp.terminal.newline();
                self.interp.terminal.put_str(&e.to_string());
                self.interp.terminal.newline();
            }
        }
    }
}
