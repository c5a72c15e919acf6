//! A tokenizing Tiny BASIC interpreter: a byte-oriented i-code tokenizer, a
//! packed program store, a recursive-descent expression evaluator, a
//! statement executor with GOSUB/FOR control stacks, a lister, and a REPL
//! driver, grounded on TOYOSHIKI TinyBASIC's `basic.c`.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod lister;
pub mod program_store;
pub mod repl;
pub mod rng;
pub mod stacks;
pub mod terminal;
pub mod token;
pub mod tokenizer;
pub mod tracer;
