//! Ex command lines typed through `:`.

use std::cell::RefCell;
use std::rc::Rc;
use vi_engine::{Buffer, Engine, HostRequest, Mode, RegisterStore, StatusLine, SurfaceExt, TextSurface};

fn engine(text: &str) -> (Engine<Buffer>, Rc<RefCell<StatusLine>>) {
    let status = StatusLine::shared();
    let engine = Engine::new(Buffer::from_text(text), RegisterStore::shared()).with_feedback(status.clone());
    (engine, status)
}

fn line(e: &Engine<Buffer>) -> usize {
    e.surface().line_of(e.surface().cursor())
}

fn last_status(status: &Rc<RefCell<StatusLine>>) -> Option<String> {
    status.borrow().last_status().map(str::to_string)
}

// ============================================================================
// Addresses and motion
// ============================================================================

#[test]
fn test_goto_line() {
    let (mut e, _) = engine("one\ntwo\n  three\nfour");
    e.feed(":3<CR>");
    assert_eq!(line(&e), 2);
    assert_eq!(e.surface().column_of(e.surface().cursor()), 2);
    e.feed(":$<CR>");
    assert_eq!(line(&e), 3);
    assert_eq!(e.mode(), Mode::Normal);
}

#[test]
fn test_goto_sets_previous_context() {
    let (mut e, _) = engine("one\ntwo\nthree");
    e.feed(":3<CR>''");
    assert_eq!(line(&e), 0);
}

#[test]
fn test_pattern_address() {
    let (mut e, _) = engine("one\ntwo\nthree\nfour");
    e.feed(":/three/d<CR>");
    assert_eq!(e.surface().text(), "one\ntwo\nfour");
}

#[test]
fn test_mark_address() {
    let (mut e, _) = engine("a\nb\nc\nd");
    e.feed("jmajjmb:'a,'bd<CR>");
    assert_eq!(e.surface().text(), "a");
}

#[test]
fn test_range_out_of_bounds() {
    let (mut e, status) = engine("one\ntwo\nthree");
    e.feed(":5,10d<CR>");
    assert_eq!(e.surface().text(), "one\ntwo\nthree");
    assert_eq!(status.borrow().errors().count(), 1);
}

// ============================================================================
// Line editing
// ============================================================================

#[test]
fn test_delete_whole_buffer() {
    let (mut e, _) = engine("one\ntwo\nthree");
    e.feed(":%d<CR>");
    assert_eq!(e.surface().text(), "");
}

#[test]
fn test_delete_with_count() {
    let (mut e, _) = engine("1\n2\n3\n4\n5");
    e.feed(":2d 2<CR>");
    assert_eq!(e.surface().text(), "1\n4\n5");
}

#[test]
fn test_yank_into_register_and_put() {
    let (mut e, _) = engine("one\ntwo\nthree");
    e.feed(":2y a<CR>");
    assert_eq!(line(&e), 0);
    assert_eq!(e.registers().borrow().require('a').unwrap().content, "two\n");
    e.feed(":$pu a<CR>");
    assert_eq!(e.surface().text(), "one\ntwo\nthree\ntwo");
    assert_eq!(line(&e), 3);
}

#[test]
fn test_put_above_first_line() {
    let (mut e, _) = engine("one\ntwo");
    e.feed("jyy:0put<CR>");
    assert_eq!(e.surface().text(), "two\none\ntwo");
}

#[test]
fn test_copy_and_move() {
    let (mut e, _) = engine("1\n2\n3\n4");
    e.feed(":1t$<CR>");
    assert_eq!(e.surface().text(), "1\n2\n3\n4\n1");
    assert_eq!(line(&e), 4);

    let (mut e, _) = engine("1\n2\n3\n4");
    e.feed(":2,3m0<CR>");
    assert_eq!(e.surface().text(), "2\n3\n1\n4");
    assert_eq!(line(&e), 1);
}

#[test]
fn test_move_into_itself_fails() {
    let (mut e, status) = engine("1\n2\n3\n4");
    e.feed(":1,3m2<CR>");
    assert_eq!(e.surface().text(), "1\n2\n3\n4");
    assert!(status.borrow().current_error().is_some());
}

#[test]
fn test_join_range() {
    let (mut e, _) = engine("a\nb\nc\nd");
    e.feed(":1,3j<CR>");
    assert_eq!(e.surface().text(), "a b c\nd");
}

#[test]
fn test_shift_lines() {
    let (mut e, _) = engine("1\n2\n3");
    e.feed(":2,3><CR>");
    assert_eq!(e.surface().text(), "1\n\t2\n\t3");
    e.feed(":set sw=4<CR>:1><CR>");
    assert_eq!(e.surface().text(), "    1\n\t2\n\t3");
    e.feed(":%<<CR>");
    assert_eq!(e.surface().text(), "1\n    2\n    3");
}

#[test]
fn test_undo_and_redo() {
    let (mut e, _) = engine("one\ntwo");
    e.feed("dd:u<CR>");
    assert_eq!(e.surface().text(), "one\ntwo");
    e.feed(":red<CR>");
    assert_eq!(e.surface().text(), "two");
}

// ============================================================================
// Substitute
// ============================================================================

#[test]
fn test_substitute_whole_buffer() {
    let (mut e, _) = engine("foo\nboo");
    e.feed(":%s/o/0/g<CR>");
    assert_eq!(e.surface().text(), "f00\nb00");
    assert_eq!(line(&e), 1);
}

#[test]
fn test_substitute_first_match_only() {
    let (mut e, _) = engine("one one one");
    e.feed(":s/one/two/<CR>");
    assert_eq!(e.surface().text(), "two one one");
}

#[test]
fn test_substitute_not_found() {
    let (mut e, status) = engine("Hello World");
    e.feed(":s/xyz/abc/<CR>");
    assert_eq!(e.surface().text(), "Hello World");
    assert_eq!(status.borrow().errors().count(), 1);
}

#[test]
fn test_repeat_substitute() {
    let (mut e, _) = engine("aaa\naaa");
    e.feed(":s/a/b/<CR>");
    assert_eq!(e.surface().text(), "baa\naaa");
    e.feed("j:&<CR>");
    assert_eq!(e.surface().text(), "baa\nbaa");
    e.feed(":&&<CR>");
    assert_eq!(e.surface().text(), "baa\nbba");
}

#[test]
fn test_substitute_count_only() {
    let (mut e, status) = engine("a\nab\nb");
    e.feed(":%s/a//n<CR>");
    assert_eq!(e.surface().text(), "a\nab\nb");
    assert_eq!(last_status(&status).as_deref(), Some("2 matches on 2 lines"));
}

#[test]
fn test_substitute_ignore_case_flag() {
    let (mut e, _) = engine("Hello hello");
    e.feed(":s/hello/bye/gi<CR>");
    assert_eq!(e.surface().text(), "bye bye");
}

#[test]
fn test_substitute_sets_search_pattern() {
    let (mut e, _) = engine("cat\ndog\ncat");
    e.feed(":s/cat/cow/<CR>n");
    assert_eq!(line(&e), 2);
}

// ============================================================================
// Options, listings and host requests
// ============================================================================

#[test]
fn test_set_query() {
    let (mut e, status) = engine("");
    e.feed(":set sw=2<CR>");
    assert_eq!(e.options().shiftwidth, 2);
    e.feed(":set sw?<CR>");
    assert_eq!(last_status(&status).as_deref(), Some("shiftwidth=2"));
    e.feed(":set ic<CR>");
    assert!(e.options().ignorecase);
    e.feed(":set bogus<CR>");
    assert!(status.borrow().current_error().is_some());
}

#[test]
fn test_print_and_line_number() {
    let (mut e, status) = engine("one\ntwo\nthree");
    e.feed(":2p<CR>");
    assert_eq!(last_status(&status).as_deref(), Some("two"));
    assert_eq!(line(&e), 1);
    e.feed(":=<CR>");
    assert_eq!(last_status(&status).as_deref(), Some("3"));
    e.feed(":.=<CR>");
    assert_eq!(last_status(&status).as_deref(), Some("2"));
}

#[test]
fn test_list_registers() {
    let (mut e, status) = engine("one\ntwo");
    e.feed("\"ayy:reg a<CR>");
    let listing = last_status(&status).unwrap();
    assert!(listing.contains("\"a"));
    assert!(listing.contains("one^J"));
}

#[test]
fn test_list_marks() {
    let (mut e, status) = engine("one\ntwo");
    e.feed(":marks<CR>");
    assert!(status.borrow().current_error().is_some());
    e.feed("jma:marks<CR>");
    let listing = last_status(&status).unwrap();
    assert!(listing.contains(" a "));
    assert!(listing.contains("two"));
}

#[test]
fn test_mark_command() {
    let (mut e, _) = engine("a\nb\nc");
    e.feed(":3mark b<CR>gg'b");
    assert_eq!(line(&e), 2);
}

#[test]
fn test_command_line_register() {
    let (mut e, _) = engine("1\n2\n3\n4");
    e.feed(":1d<CR>");
    assert_eq!(e.registers().borrow().require(':').unwrap().content, "1d");
    e.feed("@:");
    assert_eq!(e.surface().text(), "3\n4");
}

#[test]
fn test_write_request() {
    let (mut e, _) = engine("one\ntwo");
    e.feed(":w<CR>");
    assert_eq!(
        e.take_requests(),
        vec![HostRequest::Write {
            file: None,
            lines: None,
            force: false
        }]
    );
    e.feed(":1,2w out.txt<CR>");
    assert_eq!(
        e.take_requests(),
        vec![HostRequest::Write {
            file: Some("out.txt".to_string()),
            lines: Some((1, 2)),
            force: false
        }]
    );
}

#[test]
fn test_quit_refuses_unsaved_changes() {
    let (mut e, status) = engine("one");
    e.feed("x:q<CR>");
    assert!(e.take_requests().is_empty());
    assert!(status.borrow().current_error().is_some());
    e.feed(":q!<CR>");
    assert_eq!(e.take_requests(), vec![HostRequest::Quit { force: true }]);
}

#[test]
fn test_quit_after_insert_refuses() {
    let (mut e, _) = engine("");
    e.feed("ihello<Esc>:q<CR>");
    assert!(e.take_requests().is_empty());
}

#[test]
fn test_write_quit_requests() {
    let (mut e, _) = engine("one");
    e.feed(":wq<CR>");
    assert_eq!(
        e.take_requests(),
        vec![HostRequest::WriteQuit {
            file: None,
            force: false,
            if_modified: false
        }]
    );
    e.feed(":x<CR>");
    assert_eq!(
        e.take_requests(),
        vec![HostRequest::WriteQuit {
            file: None,
            force: false,
            if_modified: true
        }]
    );
}
