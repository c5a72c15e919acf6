//! End-to-end scenarios driven through the REPL with a scripted terminal,
//! plus the boundary cases and universal invariants the property tests
//! below exercise directly against the tokenizer/evaluator/store.

use proptest::prelude::*;

use ttbasic::error::ErrorKind;
use ttbasic::evaluator::{eval_expr, EvalContext};
use ttbasic::lister::list_body;
use ttbasic::program_store::ProgramStore;
use ttbasic::repl::Repl;
use ttbasic::rng::FixedRandomSource;
use ttbasic::terminal::ScriptedTerminal;
use ttbasic::tokenizer::tokenize;

fn run_session(lines: &[&str]) -> String {
    let mut repl = Repl::new(
        ScriptedTerminal::new(lines.iter().map(|s| s.to_string())),
        FixedRandomSource::new(vec![0]),
    );
    repl.run();
    repl.interp.terminal.output.clone()
}

#[test]
fn s1_print_expression_via_run() {
    let out = run_session(&["10 PRINT 1+2*3", "RUN", "SYSTEM"]);
    assert!(out.contains("7\n"));
}

#[test]
fn s2_for_next_with_semicolons_then_bare_print() {
    let out = run_session(&[
        "10 FOR I=1 TO 3",
        "20 PRINT I;",
        "30 NEXT I",
        "40 PRINT",
        "RUN",
        "SYSTEM",
    ]);
    let marker = out.find("123").expect("loop output present");
    assert_eq!(&out[marker..marker + 4], "123\n");
}

#[test]
fn s3_gosub_return_doubles_variable() {
    let out = run_session(&[
        "10 LET A=5",
        "20 GOSUB 100",
        "30 PRINT A",
        "40 STOP",
        "100 LET A=A*2",
        "110 RETURN",
        "RUN",
        "SYSTEM",
    ]);
    assert!(out.contains("10\n"));
}

#[test]
fn s4_array_default_is_zero() {
    let out = run_session(&["10 @(0)=42", "20 PRINT @(0),@(1)", "RUN", "SYSTEM"]);
    assert!(out.contains("42 0"));
}

#[test]
fn s5_if_true_runs_if_false_is_skipped() {
    let out = run_session(&[
        "10 IF 1<2 PRINT \"YES\"",
        "20 IF 2<1 PRINT \"NO\"",
        "RUN",
        "SYSTEM",
    ]);
    assert!(out.contains("YES"));
    assert!(!out.contains("NO"));
}

#[test]
fn s6_division_by_zero_reports_against_its_line() {
    let out = run_session(&["10 PRINT 1/0", "RUN", "SYSTEM"]);
    assert!(out.contains("LINE:10 PRINT 1/0"));
    assert!(out.contains("Division by zero"));
}

#[test]
fn b1_numeric_literal_boundary() {
    assert!(tokenize("32767").is_ok());
    assert_eq!(tokenize("32768").unwrap_err(), ErrorKind::Overflow);
}

/// A REM entry of exactly `total_len` bytes, built directly rather than
/// through the tokenizer (whose REM payload is capped at 255 bytes, far
/// below the chunk sizes needed to fill the store).
fn rem_entry(line_no: u16, total_len: usize) -> Vec<u8> {
    let payload_len = total_len - 3 - 2 - 1;
    let mut e = vec![0u8, 0, 0, ttbasic::token::TokenId::Rem as u8, payload_len as u8];
    e.extend(std::iter::repeat(b'x').take(payload_len));
    e.push(ttbasic::token::TokenId::Eol as u8);
    let lo_hi = line_no.to_le_bytes();
    e[1] = lo_hi[0];
    e[2] = lo_hi[1];
    e[0] = e.len() as u8;
    e
}

#[test]
fn b2_list_full_boundary() {
    let mut store = ProgramStore::new();
    // Fill the store down to exactly 20 free bytes using 255-byte-capped
    // filler lines, then confirm an entry of exactly that size succeeds
    // while one byte more reports ListFull.
    let mut line_no = 1u16;
    loop {
        let free = store.free_size() as usize;
        if free == 20 {
            break;
        }
        let chunk = (free - 20).min(255);
        store.insert(&rem_entry(line_no, chunk)).unwrap();
        line_no += 1;
    }
    assert_eq!(store.free_size(), 20);
    assert!(store.insert(&rem_entry(900, 20)).is_ok());

    let mut store2 = ProgramStore::new();
    line_no = 1;
    loop {
        let free = store2.free_size() as usize;
        if free == 20 {
            break;
        }
        let chunk = (free - 20).min(255);
        store2.insert(&rem_entry(line_no, chunk)).unwrap();
        line_no += 1;
    }
    assert_eq!(
        store2.insert(&rem_entry(900, 21)).unwrap_err(),
        ErrorKind::ListFull
    );
}

#[test]
fn b3_for_loop_iteration_counts() {
    // §4.6's own overflow precheck — `(step>0 && 32767-step<to)` — rejects
    // both of these FOR headers before the loop body ever runs: for the
    // first, 32767-1=32766<32767; for the second, 32767-32767=0<32767. Both
    // report Overflow against line 10 rather than completing any iterations.
    let out = run_session(&[
        "10 FOR I=0 TO 32767 STEP 1",
        "20 LET C=C+1",
        "30 NEXT I",
        "40 PRINT C",
        "RUN",
        "SYSTEM",
    ]);
    assert!(out.contains("LINE:10"));
    assert!(out.contains("Overflow"));

    let out2 = run_session(&[
        "10 FOR I=-32767 TO 32767 STEP 32767",
        "20 LET C=C+1",
        "30 NEXT I",
        "40 PRINT C",
        "RUN",
        "SYSTEM",
    ]);
    assert!(out2.contains("LINE:10"));
    assert!(out2.contains("Overflow"));
}

#[test]
fn b4_input_accepts_up_to_six_characters() {
    let mut repl = Repl::new(
        ScriptedTerminal::new(Vec::<String>::new()),
        FixedRandomSource::new(vec![0]),
    );
    repl.interp.terminal.queue_input("-12345");
    repl.interp.execute_direct(tokenize("INPUT A").unwrap()).unwrap();
    assert_eq!(repl.interp.vars[0], -12345);
}

struct TestCtx {
    vars: [i16; 26],
}

impl EvalContext for TestCtx {
    fn var(&self, idx: u8) -> i16 {
        self.vars[idx as usize]
    }
    fn array_get(&self, _index: i16) -> ttbasic::error::Result<i16> {
        Ok(0)
    }
    fn free_size(&self) -> i16 {
        100
    }
    fn rnd(&mut self, bound: i16) -> ttbasic::error::Result<i16> {
        if bound <= 0 {
            return Err(ErrorKind::SubscriptOutOfRange);
        }
        Ok(1)
    }
}

proptest! {
    /// P1: every line the tokenizer accepts lists back to source that
    /// re-tokenizes to the identical i-code.
    #[test]
    fn p1_listing_round_trips(a in 0i16..999, b in 0i16..999) {
        let source = format!("PRINT {}+{}", a, b);
        let body = tokenize(&source).unwrap();
        let listed = list_body(&body).unwrap();
        let retokenized = tokenize(&listed).unwrap();
        prop_assert_eq!(body, retokenized);
    }

    /// P2: inserting then deleting a line leaves the store as if it had
    /// never been entered.
    #[test]
    fn p2_insert_then_delete_is_a_no_op(n in 1u16..999) {
        let mut store = ProgramStore::new();
        let before = store.free_size();
        let mut entry = tokenize(&format!("{} PRINT 1", n)).unwrap();
        entry[0] = entry.len() as u8;
        store.insert(&entry).unwrap();
        prop_assert!(store.free_size() < before);

        let mut delete = vec![0u8; 4];
        delete[0] = 4;
        delete[1..3].copy_from_slice(&n.to_le_bytes());
        delete[3] = ttbasic::token::TokenId::Eol as u8;
        store.insert(&delete).unwrap();
        prop_assert_eq!(store.free_size(), before);
        prop_assert!(store.is_terminator(0));
    }

    /// P3: addition reduces modulo 2^16 and is reported as a signed i16,
    /// matching plain `wrapping_add`.
    #[test]
    fn p3_addition_wraps_like_i16(a in any::<i16>(), b in any::<i16>()) {
        let mut ctx = TestCtx { vars: [0; 26] };
        let body = {
            let mut v = Vec::new();
            v.push(ttbasic::token::TokenId::Num as u8);
            v.extend_from_slice(&a.to_le_bytes());
            v.push(ttbasic::token::TokenId::Plus as u8);
            v.push(ttbasic::token::TokenId::Num as u8);
            v.extend_from_slice(&b.to_le_bytes());
            v.push(ttbasic::token::TokenId::Eol as u8);
            v
        };
        let mut pos = 0usize;
        let result = eval_expr(&body, &mut pos, &mut ctx).unwrap();
        prop_assert_eq!(result, a.wrapping_add(b));
    }
}

#[test]
fn p4_sequential_program_runs_lines_in_ascending_order_once_each() {
    let out = run_session(&[
        "30 PRINT 3",
        "10 PRINT 1",
        "20 PRINT 2",
        "RUN",
        "SYSTEM",
    ]);
    let idx1 = out.find("1\n").unwrap();
    let idx2 = out.find("2\n").unwrap();
    let idx3 = out.find("3\n").unwrap();
    assert!(idx1 < idx2 && idx2 < idx3);
}

#[test]
fn p5_gosub_resumes_after_its_own_line_number_expression() {
    let out = run_session(&[
        "10 LET A=1",
        "20 GOSUB 100",
        "30 PRINT A+10",
        "40 STOP",
        "100 LET A=A+1",
        "110 RETURN",
        "RUN",
        "SYSTEM",
    ]);
    // A is 2 after the subroutine; line 30 must run (A+10 = 12), proving
    // control resumed on the statement after GOSUB within the same line.
    assert!(out.contains("12\n"));
}
