//! The terminal collaborator: character in/out, a prompt-less line editor,
//! and non-blocking key polling for the ESC-abort signal. This is the one
//! external resource the interpreter touches; raw mode is entered only
//! around reads and restored on every exit path.
//!
//! [`Terminal`] treats the terminal as an injected capability rather than a
//! global: the engine is generic over it, so tests drive the REPL and
//! executor through a scripted, in-memory terminal (see
//! [`ScriptedTerminal`]) without a real tty, and `main.rs` wires up
//! [`CrosstermTerminal`], which drives a real tty through `crossterm`'s
//! raw-mode event loop.

use std::time::Duration;

/// The terminal contract the interpreter depends on. All methods are
/// infallible from the engine's point of view: a concrete implementation
/// that hits a real I/O error has nowhere sensible to propagate it to
/// (there's no keyboard error in BASIC), so it degrades gracefully (EOF
/// reads as ENTER, a failed poll reads as "no key").
pub trait Terminal {
    /// Write one byte. No buffering guarantee is required of callers.
    fn put_char(&mut self, b: u8);

    /// Block until one byte is available and return it raw; echo (if any)
    /// is the caller's responsibility. Used by INPUT's own character-at-a-
    /// time reader, distinct from [`Terminal::read_line`]'s prompt editor.
    fn get_char(&mut self) -> u8;

    /// Non-blocking: if a key is waiting, return it without consuming any
    /// echo. `keyHit` in spec terms.
    fn key_hit(&mut self) -> Option<u8>;

    /// A prompt-less line editor: BS (0x08) and DEL (0x7F) erase left, TAB
    /// becomes a space, ENTER commits. Non-printable input is rejected.
    /// Returned line is trimmed of trailing whitespace and clamped to
    /// `SIZE_LINE - 1` characters.
    fn read_line(&mut self) -> String;

    /// Emit a host-appropriate line terminator (reference: LF only).
    fn newline(&mut self) {
        self.put_char(b'\n');
    }

    fn put_str(&mut self, s: &str) {
        for b in s.bytes() {
            self.put_char(b);
        }
    }
}

/// The real terminal: raw-mode character I/O over `crossterm`, matching the
/// teacher's `enable_raw_mode`/`disable_raw_mode`/`event::poll` usage in its
/// own `main.rs`. Raw mode is entered once for the process lifetime by the
/// caller (see `main.rs`); `read_line` and `key_hit` assume it is already
/// active.
pub struct CrosstermTerminal;

impl CrosstermTerminal {
    pub fn new() -> Self {
        CrosstermTerminal
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for CrosstermTerminal {
    fn put_char(&mut self, b: u8) {
        use std::io::Write;
        let _ = std::io::stdout().write_all(&[b]);
        let _ = std::io::stdout().flush();
    }

    fn get_char(&mut self) -> u8 {
        use crossterm::event::{self, Event, KeyCode};
        loop {
            match event::read() {
                Ok(Event::Key(key)) => {
                    let b = match key.code {
                        KeyCode::Char(c) if c.is_ascii() => c as u8,
                        KeyCode::Enter => b'\n',
                        KeyCode::Backspace | KeyCode::Delete => 8,
                        KeyCode::Esc => 27,
                        _ => continue,
                    };
                    return b;
                }
                _ => return b'\n',
            }
        }
    }

    fn key_hit(&mut self) -> Option<u8> {
        use crossterm::event::{self, Event, KeyCode};
        if matches!(event::poll(Duration::from_millis(0)), Ok(true)) {
            if let Ok(Event::Key(key)) = event::read() {
                return match key.code {
                    KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
                    KeyCode::Esc => Some(27),
                    KeyCode::Enter => Some(b'\n'),
                    _ => None,
                };
            }
        }
        None
    }

    fn read_line(&mut self) -> String {
        use crossterm::event::{self, Event, KeyCode};
        let mut line = String::new();
        loop {
            match event::read() {
                Ok(Event::Key(key)) => match key.code {
                    KeyCode::Enter => break,
                    KeyCode::Backspace | KeyCode::Delete => {
                        if line.pop().is_some() {
                            self.put_str("\u{8} \u{8}");
                        }
                    }
                    KeyCode::Tab => {
                        if line.len() < crate::config::SIZE_LINE - 1 {
                            line.push(' ');
                            self.put_char(b' ');
                        }
                    }
                    KeyCode::Char(c) if c.is_ascii() && (c as u32) >= 32 && (c as u32) <= 126 => {
                        if line.len() < crate::config::SIZE_LINE - 1 {
                            line.push(c);
                            self.put_char(c as u8);
                        }
                    }
                    KeyCode::Esc => {
                        // An ESC during line entry is not a documented
                        // contract case; fold it into a normal commit so
                        // the REPL sees whatever was typed so far.
                        break;
                    }
                    _ => {}
                },
                _ => break,
            }
        }
        self.newline();
        line.trim_end().to_string()
    }
}

/// A scripted, in-memory terminal for tests: `read_line` replays queued
/// lines, `key_hit` replays queued keys (used to script an ESC abort at a
/// specific point), and all output is captured rather than written to a
/// real tty.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    pending_lines: std::collections::VecDeque<String>,
    pending_keys: std::collections::VecDeque<u8>,
    pending_chars: std::collections::VecDeque<u8>,
    pub output: String,
}

impl ScriptedTerminal {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        ScriptedTerminal {
            pending_lines: lines.into_iter().map(Into::into).collect(),
            pending_keys: Default::default(),
            pending_chars: Default::default(),
            output: String::new(),
        }
    }

    /// Queue a key for the next [`Terminal::key_hit`] call (e.g. ESC = 27
    /// to script an abort).
    pub fn queue_key(&mut self, key: u8) {
        self.pending_keys.push_back(key);
    }

    /// Queue raw bytes, terminated by ENTER, for the next
    /// [`Terminal::get_char`]-driven read (i.e. one INPUT answer).
    pub fn queue_input(&mut self, line: &str) {
        self.pending_chars.extend(line.bytes());
        self.pending_chars.push_back(b'\n');
    }
}

impl Terminal for ScriptedTerminal {
    fn put_char(&mut self, b: u8) {
        self.output.push(b as char);
    }

    fn get_char(&mut self) -> u8 {
        self.pending_chars.pop_front().unwrap_or(b'\n')
    }

    fn key_hit(&mut self) -> Option<u8> {
        self.pending_keys.pop_front()
    }

    fn read_line(&mut self) -> String {
        self.pending_lines.pop_front().unwrap_or_default()
    }
}
