use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::{env, fs, process};

use ttbasic::repl::Repl;
use ttbasic::rng::ThreadRandomSource;
use ttbasic::terminal::CrosstermTerminal;

fn print_usage(program_name: &str) {
    eprintln!("Usage: {} [FILE]", program_name);
    eprintln!();
    eprintln!("With no FILE, starts an interactive session. With FILE, preloads");
    eprintln!("its numbered lines into the program store before prompting.");
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut filename = None;
    for arg in &args[1..] {
        if arg == "-h" || arg == "--help" {
            print_usage(&args[0]);
            return;
        }
        if filename.is_some() {
            eprintln!("Unexpected extra argument: {}", arg);
            print_usage(&args[0]);
            process::exit(1);
        }
        filename = Some(arg.clone());
    }

    let mut repl = Repl::new(CrosstermTerminal::new(), ThreadRandomSource::new());

    if let Some(path) = &filename {
        let source = fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error reading {}: {}", path, e);
            process::exit(1);
        });
        for line in source.lines() {
            repl.load_line(line);
        }
    }

    if enable_raw_mode().is_err() {
        eprintln!("Error: could not enter raw terminal mode");
        process::exit(1);
    }

    repl.run();

    let _ = disable_raw_mode();
}
