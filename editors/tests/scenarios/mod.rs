//! End-to-end scenarios: counts, registers, text objects, failures and the
//! host-facing hooks (feedback, command-line widget, registry).

use std::cell::RefCell;
use std::rc::Rc;
use vi_engine::{
    Buffer, CommandLineWidget, Engine, EngineRegistry, Mode, Outcome, RegisterKind, RegisterStore, StatusLine,
    SurfaceExt, TextSurface,
};

fn engine(text: &str) -> (Engine<Buffer>, Rc<RefCell<StatusLine>>) {
    let status = StatusLine::shared();
    let engine = Engine::new(Buffer::from_text(text), RegisterStore::shared()).with_feedback(status.clone());
    (engine, status)
}

fn numbered(n: usize) -> String {
    (1..=n).map(|i| i.to_string()).collect::<Vec<_>>().join("\n")
}

fn register(e: &Engine<Buffer>, name: char) -> Option<(String, RegisterKind)> {
    e.registers()
        .borrow()
        .require(name)
        .ok()
        .map(|entry| (entry.content.clone(), entry.kind))
}

#[test]
fn test_count_delete_words() {
    let (mut e, status) = engine("alpha beta gamma delta");
    let outcomes = e.feed("3dw");
    assert_eq!(outcomes[..2], [Outcome::Consumed, Outcome::Consumed]);
    assert!(matches!(outcomes[2], Outcome::CompletedOperation(_)));
    assert_eq!(e.surface().text(), "delta");
    assert_eq!(e.surface().cursor(), 0);
    assert_eq!(
        register(&e, '"'),
        Some(("alpha beta gamma ".to_string(), RegisterKind::Character))
    );
    assert_eq!(status.borrow().errors().count(), 0);
}

#[test]
fn test_named_register_duplicates_line() {
    let (mut e, _) = engine("first\nsecond");
    e.feed("\"ayy\"ap");
    assert_eq!(e.surface().text(), "first\nfirst\nsecond");
    assert_eq!(e.surface().line_of(e.surface().cursor()), 1);
    assert_eq!(register(&e, 'a'), Some(("first\n".to_string(), RegisterKind::Line)));
}

#[test]
fn test_ex_range_delete() {
    let (mut e, status) = engine(&numbered(12));
    let outcomes = e.feed(":5,10d<CR>");
    assert!(matches!(outcomes.last(), Some(Outcome::CompletedOperation(_))));
    assert_eq!(e.surface().text(), "1\n2\n3\n4\n11\n12");
    assert_eq!(e.mode(), Mode::Normal);
    assert_eq!(status.borrow().errors().count(), 0);
    assert_eq!(register(&e, '1').map(|r| r.1), Some(RegisterKind::Line));
}

#[test]
fn test_change_inner_word() {
    let (mut e, _) = engine("foobar");
    e.feed("llciw");
    assert_eq!(e.surface().text(), "");
    assert_eq!(e.mode(), Mode::Insert);
    assert_eq!(register(&e, '"'), Some(("foobar".to_string(), RegisterKind::Character)));
    e.feed("baz<Esc>");
    assert_eq!(e.surface().text(), "baz");
    assert_eq!(e.mode(), Mode::Normal);
}

#[test]
fn test_delete_to_matching_bracket() {
    let (mut e, _) = engine("(a (b) c) d");
    e.feed("d%");
    assert_eq!(e.surface().text(), " d");
    assert_eq!(register(&e, '"').map(|r| r.0), Some("(a (b) c)".to_string()));
}

#[test]
fn test_delete_to_missing_bracket() {
    let (mut e, status) = engine("(abc def");
    let outcomes = e.feed("d%");
    assert_eq!(outcomes[1], Outcome::Cancelled);
    assert_eq!(e.surface().text(), "(abc def");
    assert_eq!(status.borrow().errors().count(), 1);
    assert_eq!(status.borrow().bells(), 1);
    assert!(e.evaluator().is_pending());

    e.feed("<Esc>");
    assert!(!e.evaluator().is_pending());
    assert_eq!(e.mode(), Mode::Normal);
    assert_eq!(e.surface().text(), "(abc def");
}

#[test]
fn test_failed_target_keeps_operator_for_retry() {
    let (mut e, _) = engine("(abc def");
    e.feed("d%w");
    assert_eq!(e.surface().text(), "abc def");
    assert!(!e.evaluator().is_pending());
}

#[test]
fn test_undefined_sequence_rings_bell() {
    let (mut e, status) = engine("abc");
    let outcomes = e.feed("gz");
    assert_eq!(outcomes[1], Outcome::Cancelled);
    assert_eq!(status.borrow().bells(), 1);
    assert_eq!(e.surface().text(), "abc");
    assert!(!e.evaluator().is_pending());
}

#[test]
fn test_no_bell_with_noerrorbells() {
    let (mut e, status) = engine("abc");
    e.feed(":set noeb<CR>gz");
    assert_eq!(status.borrow().bells(), 0);
    assert_eq!(status.borrow().errors().count(), 1);
}

#[test]
fn test_bad_command_line_leaves_buffer() {
    let (mut e, status) = engine("one\ntwo");
    e.feed(":frobnicate<CR>");
    assert_eq!(e.surface().text(), "one\ntwo");
    assert_eq!(e.mode(), Mode::Normal);
    assert!(status.borrow().current_error().is_some());
}

#[test]
fn test_read_only_surface() {
    let mut buffer = Buffer::from_text("keep me");
    buffer.set_read_only(true);
    let status = StatusLine::shared();
    let mut e = Engine::new(buffer, RegisterStore::shared()).with_feedback(status.clone());
    e.feed("x");
    assert_eq!(e.surface().text(), "keep me");
    assert_eq!(status.borrow().errors().count(), 1);
    e.feed("l");
    assert_eq!(e.surface().cursor(), 1);
}

#[test]
fn test_count_after_operator_deletes() {
    let (mut e, _) = engine("alpha beta gamma delta");
    let outcomes = e.feed("d3w");
    assert_eq!(outcomes[..2], [Outcome::Consumed, Outcome::Consumed]);
    assert!(matches!(outcomes[2], Outcome::CompletedOperation(_)));
    assert_eq!(e.surface().text(), "delta");
    assert_eq!(e.surface().cursor(), 0);
    assert_eq!(register(&e, '"').map(|r| r.0), Some("alpha beta gamma ".to_string()));
}

#[test]
fn test_count_after_change_operator() {
    let (mut e, _) = engine("alpha beta gamma delta");
    e.feed("c2wX<Esc>");
    assert_eq!(e.surface().text(), "X gamma delta");
    assert_eq!(e.mode(), Mode::Normal);
}

#[test]
fn test_counts_before_and_after_operator_multiply() {
    let (mut e, _) = engine("a b c d e f");
    e.feed("2d2w");
    assert_eq!(e.surface().text(), "e f");
}

#[test]
fn test_count_after_yank_operator() {
    let (mut e, _) = engine("1\n2\n3\n4");
    e.feed("y2j");
    assert_eq!(e.surface().text(), "1\n2\n3\n4");
    assert_eq!(register(&e, '"'), Some(("1\n2\n3\n".to_string(), RegisterKind::Line)));
    assert_eq!(e.surface().cursor(), 0);
}

// ============================================================================
// Repeating visual changes
// ============================================================================

#[test]
fn test_repeat_replaces_older_change_after_visual_delete() {
    let (mut e, _) = engine("x one\ntwo\nthree\nfour");
    e.feed("dwjVd.");
    assert_eq!(e.surface().text(), "one\nfour");
}

#[test]
fn test_repeat_visual_delete_same_line_count() {
    let (mut e, _) = engine("1\n2\n3\n4\n5");
    e.feed("Vjd");
    assert_eq!(e.surface().text(), "3\n4\n5");
    e.feed(".");
    assert_eq!(e.surface().text(), "5");
}

#[test]
fn test_repeat_visual_change() {
    let (mut e, _) = engine("abc abc");
    e.feed("vllcX<Esc>");
    assert_eq!(e.surface().text(), "X abc");
    e.feed("w.");
    assert_eq!(e.surface().text(), "X X");
}

#[test]
fn test_repeat_visual_shift() {
    let (mut e, _) = engine("a\nb\nc\nd");
    e.feed("Vj>jj.");
    assert_eq!(e.surface().text(), "\ta\n\tb\n\tc\n\td");
}

#[test]
fn test_repeat_visual_replace() {
    let (mut e, _) = engine("abcd\nefgh");
    e.feed("vlrxj.");
    assert_eq!(e.surface().text(), "xxcd\nxxgh");
}

#[test]
fn test_repeat_visual_block_delete() {
    let (mut e, _) = engine("abc\ndef\nghi\njkl");
    e.feed("<C-v>jd");
    assert_eq!(e.surface().text(), "bc\nef\nghi\njkl");
    e.feed("jj.");
    assert_eq!(e.surface().text(), "bc\nef\nhi\nkl");
}

// ============================================================================
// Newline-terminated text
// ============================================================================

#[test]
fn test_final_newline_is_not_a_line() {
    let (mut e, _) = engine("a\nb\n");
    e.feed("G");
    assert_eq!(e.surface().line_of(e.surface().cursor()), 1);
    assert_eq!(e.surface().char_at(e.surface().cursor()), Some('b'));
    e.feed(":$d<CR>");
    assert_eq!(e.surface().text(), "a\n");
}

#[test]
fn test_delete_to_end_keeps_terminator() {
    let (mut e, _) = engine("a\nb\nc\n");
    e.feed("jdG");
    assert_eq!(e.surface().text(), "a\n");
    assert_eq!(register(&e, '"'), Some(("b\nc\n".to_string(), RegisterKind::Line)));
}

#[test]
fn test_put_and_open_below_last_terminated_line() {
    let (mut e, _) = engine("a\nb\n");
    e.feed("Gyyp");
    assert_eq!(e.surface().text(), "a\nb\nb\n");
    e.feed("ox<Esc>");
    assert_eq!(e.surface().text(), "a\nb\nb\nx\n");
    e.feed("$x");
    assert_eq!(e.surface().text(), "a\nb\nb\n\n");
}

// ============================================================================
// Registers
// ============================================================================

#[test]
fn test_uppercase_register_appends() {
    let (mut e, _) = engine("one two");
    e.feed("\"ayw\"Ayw");
    assert_eq!(register(&e, 'a').map(|r| r.0), Some("one one ".to_string()));
}

#[test]
fn test_numbered_registers_shift() {
    let (mut e, _) = engine("a\nb\nc");
    e.feed("dddd");
    assert_eq!(register(&e, '1').map(|r| r.0), Some("b\n".to_string()));
    assert_eq!(register(&e, '2').map(|r| r.0), Some("a\n".to_string()));
}

#[test]
fn test_small_delete_register() {
    let (mut e, _) = engine("hello world");
    e.feed("dw");
    assert_eq!(register(&e, '-').map(|r| r.0), Some("hello ".to_string()));
}

#[test]
fn test_black_hole_register() {
    let (mut e, _) = engine("one\ntwo");
    e.feed("\"_dd");
    assert_eq!(e.surface().text(), "two");
    assert_eq!(register(&e, '"'), None);
}

#[test]
fn test_put_from_empty_register() {
    let (mut e, status) = engine("abc");
    e.feed("\"zp");
    assert_eq!(e.surface().text(), "abc");
    assert_eq!(status.borrow().errors().count(), 1);
}

// ============================================================================
// Visual block
// ============================================================================

#[test]
fn test_visual_block_delete() {
    let (mut e, _) = engine("abc\ndef\nghi");
    e.feed("<C-v>jld");
    assert_eq!(e.surface().text(), "c\nf\nghi");
    assert_eq!(e.mode(), Mode::Normal);
}

#[test]
fn test_visual_block_yank_kind() {
    let (mut e, _) = engine("abc\ndef");
    e.feed("<C-v>jly");
    assert_eq!(register(&e, '"'), Some(("ab\nde".to_string(), RegisterKind::Block)));
}

#[test]
fn test_visual_block_insert() {
    let (mut e, _) = engine("abc\ndef");
    e.feed("<C-v>jIX<Esc>");
    assert_eq!(e.surface().text(), "Xabc\nXdef");
}

// ============================================================================
// Macros
// ============================================================================

#[test]
fn test_macro_count_and_abort() {
    let (mut e, _) = engine("1\n2\n3");
    e.feed("qqA.<Esc>jq");
    e.feed("5@q");
    assert_eq!(e.surface().text(), "1.\n2.\n3.");
    assert_eq!(e.mode(), Mode::Normal);
}

#[test]
fn test_macro_from_yanked_text() {
    let (mut e, _) = engine("x\nabc");
    e.feed("\"ayy");
    e.feed("j0");
    // register `a` holds "x\n": delete one char, then move down (fails)
    e.feed("@a");
    assert_eq!(e.surface().text(), "x\nbc");
}

// ============================================================================
// Host hooks
// ============================================================================

/// Widget that runs a fixed command whatever was typed.
struct Override;

impl CommandLineWidget for Override {
    fn show(&mut self, _prefix: char) {}

    fn update(&mut self, _text: &str) {}

    fn commit(&mut self) -> String {
        "1d".to_string()
    }

    fn cancel(&mut self) {}
}

#[test]
fn test_widget_commits_command_text() {
    let mut e = Engine::new(Buffer::from_text("one\ntwo"), RegisterStore::shared())
        .with_widget(Override);
    e.feed(":2d<CR>");
    assert_eq!(e.surface().text(), "two");
}

#[test]
fn test_registry_shares_registers() {
    let mut registry: EngineRegistry<&str, Buffer> = EngineRegistry::new(RegisterStore::shared());
    registry.get_or_create("left", || Buffer::from_text("shared line")).feed("yy");
    let right = registry.get_or_create("right", || Buffer::from_text("other"));
    right.feed("p");
    assert_eq!(right.surface().text(), "other\nshared line");
    assert_eq!(registry.len(), 2);
    assert!(registry.remove(&"left").is_some());
    assert_eq!(registry.len(), 1);
}
