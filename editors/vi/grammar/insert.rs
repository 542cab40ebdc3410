//! Insert and replace mode keys.

use crate::evaluator::frame::ArgumentKind;
use crate::input::{code, KeyEvent};

/// Cursor keys usable in insert mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// An edit made by one insert-mode key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertInput {
    Text(char),
    Newline,
    Tab,
    Backspace,
    /// `<Del>`
    DeleteForward,
    /// `Ctrl-W`
    DeleteWord,
    /// `Ctrl-U`
    DeleteToLineStart,
    Move(CursorMove),
    /// `Ctrl-R {reg}`
    Register(char),
    /// Escape: leave insert mode.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertRule {
    Input(InsertInput),
    Argument(ArgumentKind),
    /// Not an insert-mode key; the host may handle it.
    PassThrough,
}

pub fn lookup(key: &KeyEvent) -> InsertRule {
    if key.is_escape() {
        return InsertRule::Input(InsertInput::Exit);
    }
    if key.is_enter() {
        return InsertRule::Input(InsertInput::Newline);
    }
    if key.is_backspace() {
        return InsertRule::Input(InsertInput::Backspace);
    }
    if key.modifiers.command {
        return InsertRule::PassThrough;
    }
    if key.modifiers.control {
        let input = match key.code {
            'w' => InsertInput::DeleteWord,
            'u' => InsertInput::DeleteToLineStart,
            'i' => InsertInput::Tab,
            'r' => return InsertRule::Argument(ArgumentKind::InsertRegister),
            _ => return InsertRule::PassThrough,
        };
        return InsertRule::Input(input);
    }

    let input = match key.code {
        code::TAB => InsertInput::Tab,
        code::DELETE => InsertInput::DeleteForward,
        code::LEFT => InsertInput::Move(CursorMove::Left),
        code::RIGHT => InsertInput::Move(CursorMove::Right),
        code::UP => InsertInput::Move(CursorMove::Up),
        code::DOWN => InsertInput::Move(CursorMove::Down),
        code::HOME => InsertInput::Move(CursorMove::Home),
        code::END => InsertInput::Move(CursorMove::End),
        _ => match key.printable() {
            Some(c) => InsertInput::Text(c),
            None => return InsertRule::PassThrough,
        },
    };
    InsertRule::Input(input)
}
