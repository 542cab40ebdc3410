//! Property tests over random buffers and cursor positions.

use proptest::prelude::*;
use proptest::test_runner::{Config, TestCaseError, TestRunner};
use vi_engine::{Buffer, Engine, Mode, Outcome, RegisterStore, SurfaceExt, TextSurface};

fn get_test_runner(cases: u32) -> TestRunner {
    TestRunner::new(Config {
        cases,
        failure_persistence: None,

        ..Config::default()
    })
}

/// Up to six lines; the last is never empty, since joined text ending in an
/// empty line reads back as a final newline.
fn lines() -> impl Strategy<Value = Vec<String>> {
    (proptest::collection::vec("[a-z(). ]{0,10}", 0..5), "[a-z(). ]{1,10}").prop_map(|(mut lines, last)| {
        lines.push(last);
        lines
    })
}

/// Engine over `lines` with the cursor on a character picked by `seed`.
fn engine_at(lines: &[String], seed: usize) -> Engine<Buffer> {
    let mut engine = Engine::new(Buffer::from_text(&lines.join("\n")), RegisterStore::shared());
    let surface = engine.surface_mut();
    let offset = surface.clamp_normal(seed % (surface.len_chars() + 1));
    surface.set_cursor(offset);
    engine
}

fn register_name(seed: usize) -> char {
    (b'a' + (seed % 26) as u8) as char
}

fn check_escape_only(lines: Vec<String>, seed: usize, escapes: usize) -> Result<(), TestCaseError> {
    let mut e = engine_at(&lines, seed);
    let before = (e.surface().text(), e.surface().cursor());

    let outcomes = e.feed(&"<Esc>".repeat(escapes));

    prop_assert!(outcomes
        .iter()
        .all(|o| !matches!(o, Outcome::CompletedOperation(_))));
    prop_assert_eq!(e.mode(), Mode::Normal);
    prop_assert!(!e.evaluator().is_pending());
    prop_assert_eq!((e.surface().text(), e.surface().cursor()), before);
    Ok(())
}

const LINEAR_MOTIONS: &[char] = &['h', 'l', 'j', 'k', 'w', 'b', 'W', 'B'];

fn check_counted_motion(lines: Vec<String>, seed: usize, motion: usize, n: usize) -> Result<(), TestCaseError> {
    let motion = LINEAR_MOTIONS[motion % LINEAR_MOTIONS.len()];

    let mut counted = engine_at(&lines, seed);
    counted.feed(&format!("{}{}", n, motion));

    let mut repeated = engine_at(&lines, seed);
    repeated.feed(&motion.to_string().repeat(n));

    prop_assert_eq!(counted.surface().cursor(), repeated.surface().cursor());
    prop_assert_eq!(counted.surface().text(), lines.join("\n"));
    Ok(())
}

fn check_yank_put_lines(lines: Vec<String>, line: usize, count: usize, register: usize) -> Result<(), TestCaseError> {
    let first = line % lines.len();
    let count = 1 + count % (lines.len() - first);
    let name = register_name(register);

    let mut e = engine_at(&lines, 0);
    e.feed(&format!("{}G\"{}{}yy", first + 1, name, count));

    let yanked: String = lines[first..first + count].iter().map(|l| format!("{}\n", l)).collect();
    {
        let regs = e.registers();
        let regs = regs.borrow();
        prop_assert_eq!(&regs.require(name).unwrap().content, &yanked);
    }

    e.feed(&format!("\"{}P", name));
    let expected: Vec<&String> = lines[..first]
        .iter()
        .chain(&lines[first..first + count])
        .chain(&lines[first..])
        .collect();
    let expected: Vec<&str> = expected.iter().map(|l| l.as_str()).collect();
    prop_assert_eq!(e.surface().text(), expected.join("\n"));
    Ok(())
}

fn check_yank_put_chars(lines: Vec<String>, line: usize, column: usize, register: usize) -> Result<(), TestCaseError> {
    let line = line % lines.len();
    let text = &lines[line];
    if text.is_empty() {
        return Ok(());
    }
    let column = column % text.len();
    let name = register_name(register);

    let mut e = engine_at(&lines, 0);
    e.feed(&format!("{}G0", line + 1));
    if column > 0 {
        e.feed(&format!("{}l", column));
    }
    e.feed(&format!("\"{}y$", name));
    {
        let regs = e.registers();
        let regs = regs.borrow();
        prop_assert_eq!(&regs.require(name).unwrap().content, &text[column..]);
    }

    e.feed(&format!("\"{}P", name));
    let mut expected = lines.clone();
    expected[line] = format!("{}{}{}", &text[..column], &text[column..], &text[column..]);
    prop_assert_eq!(e.surface().text(), expected.join("\n"));
    Ok(())
}

const UNDEFINED: &[&str] = &["gz", "gZ", "Zx", "dp", "dZ", "yq", "c<C-z>", "<C-z>", "\"a<C-z>", "3gz"];

fn check_undefined(lines: Vec<String>, seed: usize, picks: Vec<usize>) -> Result<(), TestCaseError> {
    let mut e = engine_at(&lines, seed);
    let before = e.surface().text();

    for pick in picks {
        let outcomes = e.feed(UNDEFINED[pick % UNDEFINED.len()]);
        prop_assert!(outcomes
            .iter()
            .all(|o| !matches!(o, Outcome::CompletedOperation(_))));
        prop_assert_eq!(e.surface().text(), before.clone());
    }

    e.feed("<Esc>");
    prop_assert!(!e.evaluator().is_pending());
    prop_assert_eq!(e.mode(), Mode::Normal);
    prop_assert_eq!(e.surface().text(), before);
    Ok(())
}

fn check_repeat_delete_line(lines: Vec<String>, k: usize) -> Result<(), TestCaseError> {
    let k = 1 + k % lines.len();
    let mut e = engine_at(&lines, 0);
    e.feed(&format!("dd{}", ".".repeat(k - 1)));
    prop_assert_eq!(e.surface().text(), lines[k..].join("\n"));
    Ok(())
}

fn check_repeat_append(lines: Vec<String>, k: usize) -> Result<(), TestCaseError> {
    let k = 1 + k % lines.len();
    let mut e = engine_at(&lines, 0);
    e.feed(&format!("A!<Esc>{}", "j.".repeat(k - 1)));
    let expected: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| if i < k { format!("{}!", l) } else { l.clone() })
        .collect();
    prop_assert_eq!(e.surface().text(), expected.join("\n"));
    Ok(())
}

fn check_final_newline(lines: Vec<String>, seed: usize) -> Result<(), TestCaseError> {
    let text = format!("{}\n", lines.join("\n"));
    let mut e = Engine::new(Buffer::from_text(&text), RegisterStore::shared());
    prop_assert_eq!(e.surface().line_count(), lines.len());
    prop_assert_eq!(e.surface().text(), text.clone());

    e.feed("G");
    prop_assert_eq!(e.surface().line_of(e.surface().cursor()), lines.len() - 1);

    let target = 1 + seed % lines.len();
    e.feed(&format!(":{}d<CR>", target));
    let mut expected = lines.clone();
    expected.remove(target - 1);
    let body = expected.join("\n");
    let expected = if body.is_empty() { body } else { format!("{}\n", body) };
    prop_assert_eq!(e.surface().text(), expected);
    Ok(())
}

#[test]
fn test_escape_only_input() {
    get_test_runner(64)
        .run(&(lines(), any::<usize>(), 1_usize..10), |(lines, seed, escapes)| {
            check_escape_only(lines, seed, escapes)
        })
        .unwrap();
}

#[test]
fn test_count_equals_repetition() {
    get_test_runner(64)
        .run(
            &(lines(), any::<usize>(), any::<usize>(), 1_usize..=999),
            |(lines, seed, motion, n)| check_counted_motion(lines, seed, motion, n),
        )
        .unwrap();
}

#[test]
fn test_yank_put_lines_round_trip() {
    get_test_runner(64)
        .run(
            &(lines(), any::<usize>(), any::<usize>(), any::<usize>()),
            |(lines, line, count, register)| check_yank_put_lines(lines, line, count, register),
        )
        .unwrap();
}

#[test]
fn test_yank_put_chars_round_trip() {
    get_test_runner(64)
        .run(
            &(lines(), any::<usize>(), any::<usize>(), any::<usize>()),
            |(lines, line, column, register)| check_yank_put_chars(lines, line, column, register),
        )
        .unwrap();
}

#[test]
fn test_undefined_sequences_do_not_mutate() {
    get_test_runner(64)
        .run(
            &(lines(), any::<usize>(), proptest::collection::vec(any::<usize>(), 1..5)),
            |(lines, seed, picks)| check_undefined(lines, seed, picks),
        )
        .unwrap();
}

#[test]
fn test_repeat_applies_k_times() {
    get_test_runner(64)
        .run(&(lines(), any::<usize>()), |(lines, k)| {
            check_repeat_delete_line(lines.clone(), k)?;
            check_repeat_append(lines, k)
        })
        .unwrap();
}

#[test]
fn test_final_newline_terminates_last_line() {
    get_test_runner(64)
        .run(&(lines(), any::<usize>()), |(lines, seed)| check_final_newline(lines, seed))
        .unwrap();
}
