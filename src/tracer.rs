//! Opt-in execution tracer: one entry per executed statement, a
//! `serde`/`serde_json` dump, gated behind an `enabled` flag with zero
//! effect on interpreter semantics when off. The REPL's own user-facing
//! output (banner, prompts, error reports) never goes through this — it
//! goes through [`crate::terminal::Terminal`] — this is purely a debugging
//! side channel.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub line_no: Option<u16>,
    pub icode_offset: usize,
    pub token: String,
    pub variables: [i16; crate::config::VAR_COUNT],
}

#[derive(Debug, Default)]
pub struct Tracer {
    enabled: bool,
    entries: Vec<TraceEntry>,
}

impl Tracer {
    pub fn new() -> Self {
        Tracer::default()
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, line_no: Option<u16>, icode_offset: usize, token: &str, variables: &[i16; crate::config::VAR_COUNT]) {
        if !self.enabled {
            return;
        }
        self.entries.push(TraceEntry {
            line_no,
            icode_offset,
            token: token.to_string(),
            variables: *variables,
        });
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn dump_to_writer<W: std::io::Write>(&self, writer: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.entries)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracer_records_nothing() {
        let mut t = Tracer::new();
        t.record(Some(10), 3, "PRINT", &[0; crate::config::VAR_COUNT]);
        assert!(t.entries().is_empty());
    }

    #[test]
    fn enabled_tracer_accumulates_entries() {
        let mut t = Tracer::new();
        t.enable();
        t.record(Some(10), 3, "PRINT", &[0; crate::config::VAR_COUNT]);
        t.record(Some(20), 0, "NEXT", &[1; crate::config::VAR_COUNT]);
        assert_eq!(t.entries().len(), 2);
        assert_eq!(t.entries()[0].token, "PRINT");
        assert_eq!(t.entries()[1].variables[0], 1);
    }

    #[test]
    fn dumps_valid_json() {
        let mut t = Tracer::new();
        t.enable();
        t.record(None, 0, "GOTO", &[0; crate::config::VAR_COUNT]);
        let mut buf = Vec::new();
        t.dump_to_writer(&mut buf).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert!(parsed.is_array());
    }
}
