//! Operator × target matrix: counts on either side of the operator, line
//! and character classification, and what lands in the unnamed register.

use vi_engine::{Buffer, Engine, Mode, RegisterKind, RegisterStore, SurfaceExt};

#[derive(Debug)]
struct Case<'a> {
    name: &'a str,
    text: &'a str,
    keys: &'a str,
    expect: &'a str,
    register: Option<(&'a str, RegisterKind)>,
}

fn run(cases: &[Case]) {
    for case in cases {
        let mut e = Engine::new(Buffer::from_text(case.text), RegisterStore::shared());
        e.feed(case.keys);
        assert_eq!(e.surface().text(), case.expect, "{}: text", case.name);
        assert_eq!(e.mode(), Mode::Normal, "{}: mode", case.name);
        assert!(!e.evaluator().is_pending(), "{}: pending", case.name);
        if let Some((content, kind)) = case.register {
            let registers = e.registers().borrow();
            let entry = registers.require('"').unwrap();
            assert_eq!(entry.content, content, "{}: register", case.name);
            assert_eq!(entry.kind, kind, "{}: register kind", case.name);
        }
    }
}

#[test]
fn delete_target_matrix() {
    run(&[
        Case {
            name: "dw_charwise",
            text: "one two three\n",
            keys: "dw",
            expect: "two three\n",
            register: Some(("one ", RegisterKind::Character)),
        },
        Case {
            name: "2dw_count_before",
            text: "one two three four",
            keys: "2dw",
            expect: "three four",
            register: Some(("one two ", RegisterKind::Character)),
        },
        Case {
            name: "d2w_count_after",
            text: "one two three four",
            keys: "d2w",
            expect: "three four",
            register: Some(("one two ", RegisterKind::Character)),
        },
        Case {
            name: "2d2w_counts_multiply",
            text: "a b c d e f",
            keys: "2d2w",
            expect: "e f",
            register: Some(("a b c d ", RegisterKind::Character)),
        },
        Case {
            name: "dj_linewise_two_lines",
            text: "l1\nl2\nl3\n",
            keys: "dj",
            expect: "l3\n",
            register: Some(("l1\nl2\n", RegisterKind::Line)),
        },
        Case {
            name: "2dj_linewise_three_lines",
            text: "a1\na2\na3\na4\n",
            keys: "2dj",
            expect: "a4\n",
            register: Some(("a1\na2\na3\n", RegisterKind::Line)),
        },
        Case {
            name: "d2j_linewise_three_lines",
            text: "b1\nb2\nb3\nb4\n",
            keys: "d2j",
            expect: "b4\n",
            register: Some(("b1\nb2\nb3\n", RegisterKind::Line)),
        },
        Case {
            name: "d3d_count_on_doubled_key",
            text: "1\n2\n3\n4",
            keys: "d3d",
            expect: "4",
            register: Some(("1\n2\n3\n", RegisterKind::Line)),
        },
        Case {
            name: "dd_terminated_text",
            text: "a\nb\n",
            keys: "dd",
            expect: "b\n",
            register: Some(("a\n", RegisterKind::Line)),
        },
        Case {
            name: "dG_to_last_line",
            text: "1\n2\n3",
            keys: "dG",
            expect: "",
            register: Some(("1\n2\n3\n", RegisterKind::Line)),
        },
        Case {
            name: "d2gg_count_after_prefix",
            text: "1\n2\n3",
            keys: "d2gg",
            expect: "3",
            register: Some(("1\n2\n", RegisterKind::Line)),
        },
        Case {
            name: "d2e_inclusive",
            text: "one two three",
            keys: "d2e",
            expect: " three",
            register: Some(("one two", RegisterKind::Character)),
        },
        Case {
            name: "d2fo_counted_find",
            text: "foo boo zoo",
            keys: "d2fo",
            expect: " boo zoo",
            register: Some(("foo", RegisterKind::Character)),
        },
        Case {
            name: "d2aw_counted_object",
            text: "one two three",
            keys: "d2aw",
            expect: "three",
            register: Some(("one two ", RegisterKind::Character)),
        },
        Case {
            name: "d$_to_line_end",
            text: "one two\nthree",
            keys: "d$",
            expect: "\nthree",
            register: Some(("one two", RegisterKind::Character)),
        },
    ]);
}

#[test]
fn yank_target_matrix() {
    run(&[
        Case {
            name: "y2w_charwise",
            text: "one two three",
            keys: "y2w",
            expect: "one two three",
            register: Some(("one two ", RegisterKind::Character)),
        },
        Case {
            name: "y2j_linewise",
            text: "a\nb\nc\nd",
            keys: "y2j",
            expect: "a\nb\nc\nd",
            register: Some(("a\nb\nc\n", RegisterKind::Line)),
        },
        Case {
            name: "2yy_linewise",
            text: "a\nb\nc",
            keys: "2yy",
            expect: "a\nb\nc",
            register: Some(("a\nb\n", RegisterKind::Line)),
        },
        Case {
            name: "y3l_charwise",
            text: "abcdef",
            keys: "y3l",
            expect: "abcdef",
            register: Some(("abc", RegisterKind::Character)),
        },
    ]);
}

#[test]
fn change_and_filter_target_matrix() {
    run(&[
        Case {
            name: "c2w_count_after",
            text: "alpha beta gamma delta",
            keys: "c2wX<Esc>",
            expect: "X gamma delta",
            register: Some(("alpha beta", RegisterKind::Character)),
        },
        Case {
            name: "2cw_count_before",
            text: "alpha beta gamma delta",
            keys: "2cwX<Esc>",
            expect: "X gamma delta",
            register: Some(("alpha beta", RegisterKind::Character)),
        },
        Case {
            name: "c$_to_line_end",
            text: "one two",
            keys: "wc$X<Esc>",
            expect: "one X",
            register: Some(("two", RegisterKind::Character)),
        },
        Case {
            name: ">2j_shift_three_lines",
            text: "a\nb\nc\nd",
            keys: ">2j",
            expect: "\ta\n\tb\n\tc\nd",
            register: None,
        },
        Case {
            name: "g~2w_toggle_case",
            text: "ab cd ef",
            keys: "g~2w",
            expect: "AB CD ef",
            register: None,
        },
        Case {
            name: "gUiw_upper_object",
            text: "abc def",
            keys: "gUiw",
            expect: "ABC def",
            register: None,
        },
        Case {
            name: "gu2l_lower_count_after",
            text: "ABC",
            keys: "gu2l",
            expect: "abC",
            register: None,
        },
    ]);
}
