//! Key sequences run through a headless engine over a plain buffer.
//!
//! These tests exercise complete command sequences the way a host would
//! deliver them, one key at a time, and check the resulting text, cursor
//! and mode.

use vi_engine::{Buffer, Engine, Mode, RegisterKind, RegisterStore, SurfaceExt, TextSurface};

fn engine(text: &str) -> Engine<Buffer> {
    Engine::new(Buffer::from_text(text), RegisterStore::shared())
}

/// Cursor as (line, column), both 0-based.
fn cursor(e: &Engine<Buffer>) -> (usize, usize) {
    let s = e.surface();
    let offset = s.cursor();
    (s.line_of(offset), s.column_of(offset))
}

fn text(e: &Engine<Buffer>) -> String {
    e.surface().text()
}

// ============================================================================
// Insert mode
// ============================================================================

#[test]
fn test_insert_hello_world() {
    let mut e = engine("");
    e.feed("iHello World<Esc>");
    assert_eq!(text(&e), "Hello World");
    assert_eq!(e.mode(), Mode::Normal);
    assert_eq!(cursor(&e), (0, 10));
}

#[test]
fn test_insert_multiple_lines() {
    let mut e = engine("");
    e.feed("iLine 1<CR>Line 2<CR>Line 3<Esc>");
    assert_eq!(text(&e), "Line 1\nLine 2\nLine 3");
    assert_eq!(cursor(&e), (2, 5));
}

#[test]
fn test_append_after_cursor() {
    let mut e = engine("Hello");
    e.feed("$a World<Esc>");
    assert_eq!(text(&e), "Hello World");
}

#[test]
fn test_append_end_of_line() {
    let mut e = engine("Hello");
    e.feed("A World<Esc>");
    assert_eq!(text(&e), "Hello World");
}

#[test]
fn test_insert_at_first_non_blank() {
    let mut e = engine("  World");
    e.feed("$IHello <Esc>");
    assert_eq!(text(&e), "  Hello World");
}

#[test]
fn test_open_line_below() {
    let mut e = engine("Line 1\nLine 3");
    e.feed("oLine 2<Esc>");
    assert_eq!(text(&e), "Line 1\nLine 2\nLine 3");
    assert_eq!(cursor(&e), (1, 5));
}

#[test]
fn test_open_line_above() {
    let mut e = engine("Line 2");
    e.feed("OLine 1<Esc>");
    assert_eq!(text(&e), "Line 1\nLine 2");
    assert_eq!(cursor(&e).0, 0);
}

#[test]
fn test_insert_backspace() {
    let mut e = engine("");
    e.feed("iabcd<BS><BS>x<Esc>");
    assert_eq!(text(&e), "abx");
}

#[test]
fn test_replace_mode() {
    let mut e = engine("abcdef");
    e.feed("Rxy<Esc>");
    assert_eq!(text(&e), "xycdef");
    assert_eq!(cursor(&e), (0, 1));
}

#[test]
fn test_replace_mode_backspace_restores() {
    let mut e = engine("abc");
    e.feed("Rxyz<BS><BS><Esc>");
    assert_eq!(text(&e), "xbc");
}

#[test]
fn test_insert_register() {
    let mut e = engine("word");
    e.feed("yiwA <C-r>0<Esc>");
    assert_eq!(text(&e), "word word");
}

// ============================================================================
// Motions
// ============================================================================

#[test]
fn test_hjkl_motions() {
    let mut e = engine("abcd\nefgh\nijkl");
    e.feed("ll");
    assert_eq!(cursor(&e), (0, 2));
    e.feed("j");
    assert_eq!(cursor(&e), (1, 2));
    e.feed("h");
    assert_eq!(cursor(&e), (1, 1));
    e.feed("k");
    assert_eq!(cursor(&e), (0, 1));
}

#[test]
fn test_word_motions() {
    let mut e = engine("one two three");
    e.feed("w");
    assert_eq!(cursor(&e), (0, 4));
    e.feed("w");
    assert_eq!(cursor(&e), (0, 8));
    e.feed("b");
    assert_eq!(cursor(&e), (0, 4));
    e.feed("e");
    assert_eq!(cursor(&e), (0, 6));
}

#[test]
fn test_line_motions() {
    let mut e = engine("  hello world");
    e.feed("$");
    assert_eq!(cursor(&e), (0, 12));
    e.feed("0");
    assert_eq!(cursor(&e), (0, 0));
    e.feed("^");
    assert_eq!(cursor(&e), (0, 2));
}

#[test]
fn test_goto_line() {
    let mut e = engine("1\n2\n3\n4\n5");
    e.feed("G");
    assert_eq!(cursor(&e).0, 4);
    e.feed("1G");
    assert_eq!(cursor(&e).0, 0);
    e.feed("3G");
    assert_eq!(cursor(&e).0, 2);
    e.feed("gg");
    assert_eq!(cursor(&e).0, 0);
}

#[test]
fn test_find_char() {
    let mut e = engine("Hello World");
    e.feed("fo");
    assert_eq!(cursor(&e), (0, 4));
    e.feed(";");
    assert_eq!(cursor(&e), (0, 7));
    e.feed(",");
    assert_eq!(cursor(&e), (0, 4));
}

#[test]
fn test_vertical_motion_keeps_column() {
    let mut e = engine("long line here\nab\nanother long line");
    e.feed("8|");
    assert_eq!(cursor(&e), (0, 7));
    e.feed("j");
    assert_eq!(cursor(&e), (1, 1));
    e.feed("j");
    assert_eq!(cursor(&e), (2, 7));
}

#[test]
fn test_cursor_bounds() {
    let mut e = engine("abc");
    e.feed("llllllllll");
    assert_eq!(cursor(&e), (0, 2));
}

// ============================================================================
// Deletion
// ============================================================================

#[test]
fn test_delete_char() {
    let mut e = engine("Hello");
    e.feed("x");
    assert_eq!(text(&e), "ello");
}

#[test]
fn test_delete_char_before() {
    let mut e = engine("Hello");
    e.feed("lllX");
    assert_eq!(text(&e), "Helo");
    assert_eq!(cursor(&e), (0, 2));
}

#[test]
fn test_delete_word() {
    let mut e = engine("Hello World");
    e.feed("dw");
    assert_eq!(text(&e), "World");
}

#[test]
fn test_delete_line() {
    let mut e = engine("Line 1\nLine 2\nLine 3");
    e.feed("jdd");
    assert_eq!(text(&e), "Line 1\nLine 3");
    assert_eq!(cursor(&e), (1, 0));
}

#[test]
fn test_delete_multiple_lines() {
    let mut e = engine("Line 1\nLine 2\nLine 3\nLine 4");
    e.feed("j2dd");
    assert_eq!(text(&e), "Line 1\nLine 4");
}

#[test]
fn test_delete_last_line_moves_up() {
    let mut e = engine("one\ntwo");
    e.feed("Gdd");
    assert_eq!(text(&e), "one");
    assert_eq!(cursor(&e), (0, 0));
}

#[test]
fn test_delete_to_end_of_line() {
    let mut e = engine("Hello World");
    e.feed("wD");
    assert_eq!(text(&e), "Hello ");
    assert_eq!(cursor(&e), (0, 5));
}

#[test]
fn test_escape_cancels_operator() {
    let mut e = engine("Hello");
    e.feed("d<Esc>");
    assert_eq!(text(&e), "Hello");
    assert_eq!(e.mode(), Mode::Normal);
}

// ============================================================================
// Change
// ============================================================================

#[test]
fn test_change_word() {
    let mut e = engine("Hello World");
    e.feed("cwGoodbye<Esc>");
    assert_eq!(text(&e), "Goodbye World");
}

#[test]
fn test_change_line() {
    let mut e = engine("Old Line\nKeep this");
    e.feed("ccNew Line<Esc>");
    assert_eq!(text(&e), "New Line\nKeep this");
}

#[test]
fn test_substitute_char() {
    let mut e = engine("Hello");
    e.feed("sJ<Esc>");
    assert_eq!(text(&e), "Jello");
}

#[test]
fn test_change_to_end_of_line() {
    let mut e = engine("Hello World");
    e.feed("wCthere<Esc>");
    assert_eq!(text(&e), "Hello there");
}

// ============================================================================
// Yank and put
// ============================================================================

#[test]
fn test_yank_line_and_put() {
    let mut e = engine("Hello");
    e.feed("yy");
    {
        let registers = e.registers().borrow();
        let entry = registers.require('"').unwrap();
        assert_eq!(entry.content, "Hello\n");
        assert_eq!(entry.kind, RegisterKind::Line);
    }
    e.feed("p");
    assert_eq!(text(&e), "Hello\nHello");
    assert_eq!(cursor(&e), (1, 0));
}

#[test]
fn test_yank_word_and_put() {
    let mut e = engine("Hello World");
    e.feed("yw$p");
    assert_eq!(text(&e), "Hello WorldHello ");
}

#[test]
fn test_named_register() {
    let mut e = engine("Hello");
    e.feed("\"ayy");
    assert_eq!(e.registers().borrow().require('a').unwrap().content, "Hello\n");
}

#[test]
fn test_yank_to_end_of_line() {
    let mut e = engine("Hello World");
    e.feed("y$");
    assert_eq!(e.registers().borrow().require('"').unwrap().content, "Hello World");
    assert_eq!(text(&e), "Hello World");
}

#[test]
fn test_yank_char_motion() {
    let mut e = engine("Hello");
    e.feed("yl");
    assert_eq!(e.registers().borrow().require('"').unwrap().content, "H");
}

#[test]
fn test_yank_put_workflow() {
    let mut e = engine("AAA\nBBB\nCCC");
    e.feed("yyGp");
    assert_eq!(text(&e), "AAA\nBBB\nCCC\nAAA");
}

#[test]
fn test_put_before() {
    let mut e = engine("one\ntwo");
    e.feed("jyykP");
    assert_eq!(text(&e), "two\none\ntwo");
}

// ============================================================================
// Undo and repeat
// ============================================================================

#[test]
fn test_undo_insert() {
    let mut e = engine("");
    e.feed("iHello<Esc>");
    assert_eq!(text(&e), "Hello");
    e.feed("u");
    assert_eq!(text(&e), "");
}

#[test]
fn test_undo_delete_and_redo() {
    let mut e = engine("Hello");
    e.feed("x");
    assert_eq!(text(&e), "ello");
    e.feed("u");
    assert_eq!(text(&e), "Hello");
    e.feed("<C-r>");
    assert_eq!(text(&e), "ello");
}

#[test]
fn test_change_undoes_as_one_step() {
    let mut e = engine("Hello World");
    e.feed("cwGoodbye<Esc>u");
    assert_eq!(text(&e), "Hello World");
}

#[test]
fn test_dot_repeat_delete() {
    let mut e = engine("Line 1\nLine 2\nLine 3");
    e.feed("dd");
    assert_eq!(text(&e), "Line 2\nLine 3");
    e.feed(".");
    assert_eq!(text(&e), "Line 3");
}

#[test]
fn test_dot_repeat_insert() {
    let mut e = engine("a\nb");
    e.feed("iX<Esc>");
    e.feed("j0.");
    assert_eq!(text(&e), "Xa\nXb");
}

#[test]
fn test_dot_with_count() {
    let mut e = engine("aaaaa");
    e.feed("x");
    assert_eq!(text(&e), "aaaa");
    e.feed("3.");
    assert_eq!(text(&e), "a");
}

#[test]
fn test_dot_repeats_change_word() {
    let mut e = engine("one two");
    e.feed("cwxx<Esc>w.");
    assert_eq!(text(&e), "xx xx");
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_search_forward() {
    let mut e = engine("Hello World");
    e.feed("/World<CR>");
    assert_eq!(cursor(&e), (0, 6));
    assert_eq!(e.mode(), Mode::Normal);
}

#[test]
fn test_search_next() {
    let mut e = engine("one two one three one");
    e.feed("/one<CR>");
    assert_eq!(cursor(&e), (0, 8));
    e.feed("n");
    assert_eq!(cursor(&e), (0, 18));
    e.feed("N");
    assert_eq!(cursor(&e), (0, 8));
}

#[test]
fn test_search_backward() {
    let mut e = engine("abc\nxyz\nabc");
    e.feed("G$?abc<CR>");
    assert_eq!(cursor(&e), (2, 0));
}

#[test]
fn test_escape_abandons_search() {
    let mut e = engine("Hello World");
    e.feed("/Wor<Esc>");
    assert_eq!(cursor(&e), (0, 0));
    assert_eq!(e.mode(), Mode::Normal);
}

// ============================================================================
// Replace, join and case
// ============================================================================

#[test]
fn test_replace_char() {
    let mut e = engine("Hello");
    e.feed("rJ");
    assert_eq!(text(&e), "Jello");
}

#[test]
fn test_replace_multiple() {
    let mut e = engine("aaaa");
    e.feed("rx");
    assert_eq!(text(&e), "xaaa");
    e.feed("lrx");
    assert_eq!(text(&e), "xxaa");
    e.feed("2rz");
    assert_eq!(text(&e), "xzza");
}

#[test]
fn test_join_lines() {
    let mut e = engine("Hello\nWorld");
    e.feed("J");
    assert_eq!(text(&e), "Hello World");
    assert_eq!(cursor(&e), (0, 5));
}

#[test]
fn test_toggle_case() {
    let mut e = engine("abc");
    e.feed("~~");
    assert_eq!(text(&e), "ABc");
    assert_eq!(cursor(&e), (0, 2));
}

// ============================================================================
// Marks and visual mode
// ============================================================================

#[test]
fn test_set_and_jump_to_mark() {
    let mut e = engine("L1\nL2\nL3");
    e.feed("jma");
    e.feed("1G");
    assert_eq!(cursor(&e).0, 0);
    e.feed("'a");
    assert_eq!(cursor(&e).0, 1);
}

#[test]
fn test_visual_line_delete() {
    let mut e = engine("one\ntwo\nthree\nfour");
    e.feed("jVjd");
    assert_eq!(text(&e), "one\nfour");
    assert_eq!(e.mode(), Mode::Normal);
}

#[test]
fn test_visual_yank_returns_to_normal() {
    let mut e = engine("Hello World");
    e.feed("vey");
    assert_eq!(e.registers().borrow().require('"').unwrap().content, "Hello");
    assert_eq!(e.mode(), Mode::Normal);
    assert_eq!(cursor(&e), (0, 0));
}

#[test]
fn test_visual_inner_word() {
    let mut e = engine("say hello there");
    e.feed("wviwd");
    assert_eq!(text(&e), "say  there");
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn test_complex_edit_sequence() {
    let mut e = engine("Hello World");
    e.feed("wcwUniverse<Esc>");
    assert_eq!(text(&e), "Hello Universe");
}

#[test]
fn test_multiple_operations() {
    let mut e = engine("");
    e.feed("iFirst line<CR>Second line<CR>Third line<Esc>");
    e.feed("2Gdd");
    e.feed("1GA - edited<Esc>");
    assert_eq!(text(&e), "First line - edited\nThird line");
}

#[test]
fn test_empty_buffer_operations() {
    let mut e = engine("");
    e.feed("dd");
    e.feed("x");
    e.feed("yy");
    assert_eq!(text(&e), "");
    assert_eq!(e.mode(), Mode::Normal);
}
