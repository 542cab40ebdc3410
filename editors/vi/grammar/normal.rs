//! Normal, visual and operator-pending key tables.

use super::{Context, Rule};
use crate::command::{FindKind, Motion, Operator, Scope};
use crate::evaluator::frame::{ArgumentKind, VisualKind};
use crate::evaluator::operation::{Action, InsertAt, Target};
use crate::input::{code, KeyEvent};
use crate::search::SearchDirection;

/// Keys that are motions in every normal-style context.
pub fn motion(key: &KeyEvent) -> Option<Motion> {
    if key.modifiers.command || key.modifiers.option {
        return None;
    }
    if key.modifiers.control {
        return match key.code {
            'h' => Some(Motion::Left),
            'n' | 'j' => Some(Motion::Down),
            'p' => Some(Motion::Up),
            'm' => Some(Motion::NextLine),
            _ => None,
        };
    }

    let motion = match key.code {
        code::LEFT | code::BACKSPACE | 'h' => Motion::Left,
        code::RIGHT | ' ' | 'l' => Motion::Right,
        code::UP | 'k' => Motion::Up,
        code::DOWN | 'j' => Motion::Down,
        code::HOME | '0' => Motion::LineStart,
        code::END | '$' => Motion::LineEnd,
        code::ENTER | '+' => Motion::NextLine,
        '-' => Motion::PrevLine,
        '_' => Motion::CurrentLine,
        '^' => Motion::FirstNonBlank,
        '|' => Motion::Column,
        'w' => Motion::WordForward { big: false },
        'W' => Motion::WordForward { big: true },
        'b' => Motion::WordBackward { big: false },
        'B' => Motion::WordBackward { big: true },
        'e' => Motion::WordEnd { big: false },
        'E' => Motion::WordEnd { big: true },
        'G' => Motion::GotoLine,
        ';' => Motion::RepeatFind { reverse: false },
        ',' => Motion::RepeatFind { reverse: true },
        '%' => Motion::MatchPair,
        '(' => Motion::SentenceBackward,
        ')' => Motion::SentenceForward,
        '{' => Motion::ParagraphBackward,
        '}' => Motion::ParagraphForward,
        'n' => Motion::SearchNext { reverse: false },
        'N' => Motion::SearchNext { reverse: true },
        '*' => Motion::SearchWord {
            direction: SearchDirection::Forward,
        },
        '#' => Motion::SearchWord {
            direction: SearchDirection::Backward,
        },
        _ => return None,
    };
    Some(motion)
}

/// Keys shared by every context that take a character argument.
fn argument(c: char) -> Option<ArgumentKind> {
    if let Some(kind) = FindKind::from_key(c) {
        return Some(ArgumentKind::Find(kind));
    }
    match c {
        '\'' => Some(ArgumentKind::GotoMark { linewise: true }),
        '`' => Some(ArgumentKind::GotoMark { linewise: false }),
        _ => None,
    }
}

/// Look up a key. `recording` tells whether `q` stops a recording.
pub fn lookup(key: &KeyEvent, ctx: Context, recording: bool) -> Option<Rule> {
    if let Some(motion) = motion(key) {
        return Some(Rule::Motion(motion));
    }
    if key.modifiers.control {
        return control(key, ctx);
    }
    let c = key.printable()?;
    if let Some(kind) = argument(c) {
        return Some(Rule::Argument(kind));
    }
    match ctx {
        Context::Normal => normal(c, recording),
        Context::Visual(_) => visual(c),
        Context::OperatorPending(_) => pending(c),
    }
}

fn control(key: &KeyEvent, ctx: Context) -> Option<Rule> {
    let action = match (key.code, ctx) {
        ('v', Context::Normal | Context::Visual(_)) => Action::EnterVisual(VisualKind::Block),
        ('r', Context::Normal) => Action::Redo,
        ('g', Context::Normal) => Action::ShowPosition,
        _ => return None,
    };
    Some(Rule::Action(action))
}

fn normal(c: char, recording: bool) -> Option<Rule> {
    if let Some(op) = Operator::from_key(c) {
        return Some(Rule::Operator(op));
    }
    let rule = match c {
        'x' => Rule::Alias(Operator::Delete, Target::Motion(Motion::Right)),
        'X' => Rule::Alias(Operator::Delete, Target::Motion(Motion::Left)),
        'D' => Rule::Alias(Operator::Delete, Target::Motion(Motion::LineEnd)),
        'C' => Rule::Alias(Operator::Change, Target::Motion(Motion::LineEnd)),
        's' => Rule::Alias(Operator::Change, Target::Motion(Motion::Right)),
        'S' => Rule::Alias(Operator::Change, Target::Line),
        'Y' => Rule::Alias(Operator::Yank, Target::Line),
        'p' => Rule::Action(Action::Put { after: true }),
        'P' => Rule::Action(Action::Put { after: false }),
        'J' => Rule::Action(Action::Join { spaces: true }),
        'u' => Rule::Action(Action::Undo),
        '.' => Rule::Action(Action::RepeatChange),
        '~' => Rule::Action(Action::ToggleCaseChar),
        'i' => Rule::Action(Action::Insert(InsertAt::Before)),
        'a' => Rule::Action(Action::Insert(InsertAt::After)),
        'I' => Rule::Action(Action::Insert(InsertAt::FirstNonBlank)),
        'A' => Rule::Action(Action::Insert(InsertAt::LineEnd)),
        'o' => Rule::Action(Action::Insert(InsertAt::OpenBelow)),
        'O' => Rule::Action(Action::Insert(InsertAt::OpenAbove)),
        'R' => Rule::Action(Action::Insert(InsertAt::Replace)),
        'v' => Rule::Action(Action::EnterVisual(VisualKind::Char)),
        'V' => Rule::Action(Action::EnterVisual(VisualKind::Line)),
        'r' => Rule::Argument(ArgumentKind::Replace),
        'm' => Rule::Argument(ArgumentKind::SetMark),
        'q' if recording => Rule::Action(Action::StopRecording),
        'q' => Rule::Argument(ArgumentKind::Record),
        '@' => Rule::Argument(ArgumentKind::Play),
        ':' | '/' | '?' => Rule::CommandLine(c),
        'g' | 'Z' => Rule::Prefix(c),
        '"' => Rule::Register,
        _ => return None,
    };
    Some(rule)
}

fn visual(c: char) -> Option<Rule> {
    let on_selection = |op| Rule::Alias(op, Target::Visual);
    let on_lines = |op| Rule::Alias(op, Target::Line);
    let rule = match c {
        'd' | 'x' => on_selection(Operator::Delete),
        'y' => on_selection(Operator::Yank),
        'c' | 's' => on_selection(Operator::Change),
        '>' => on_selection(Operator::ShiftRight),
        '<' => on_selection(Operator::ShiftLeft),
        '~' => on_selection(Operator::ToggleCase),
        'u' => on_selection(Operator::Lowercase),
        'U' => on_selection(Operator::Uppercase),
        'D' | 'X' => on_lines(Operator::Delete),
        'Y' => on_lines(Operator::Yank),
        'C' | 'S' | 'R' => on_lines(Operator::Change),
        'J' => Rule::Action(Action::Join { spaces: true }),
        'p' => Rule::Action(Action::Put { after: true }),
        'P' => Rule::Action(Action::Put { after: false }),
        'o' | 'O' => Rule::Action(Action::SwapVisualEnds),
        'v' => Rule::Action(Action::EnterVisual(VisualKind::Char)),
        'V' => Rule::Action(Action::EnterVisual(VisualKind::Line)),
        'I' => Rule::Action(Action::VisualInsert { append: false }),
        'A' => Rule::Action(Action::VisualInsert { append: true }),
        'i' => Rule::TextObject(Scope::Inner),
        'a' => Rule::TextObject(Scope::Around),
        'r' => Rule::Argument(ArgumentKind::Replace),
        'm' => Rule::Argument(ArgumentKind::SetMark),
        ':' | '/' | '?' => Rule::CommandLine(c),
        'g' => Rule::Prefix('g'),
        '"' => Rule::Register,
        _ => return None,
    };
    Some(rule)
}

fn pending(c: char) -> Option<Rule> {
    if let Some(op) = Operator::from_key(c) {
        return Some(Rule::Operator(op));
    }
    match c {
        'i' => Some(Rule::TextObject(Scope::Inner)),
        'a' => Some(Rule::TextObject(Scope::Around)),
        'g' => Some(Rule::Prefix('g')),
        _ => None,
    }
}

/// Second key of a two-key command.
pub fn lookup_prefix(prefix: char, key: &KeyEvent, ctx: Context) -> Option<Rule> {
    let c = key.printable()?;
    match (prefix, c) {
        ('g', 'g') => Some(Rule::Motion(Motion::FirstLine)),
        ('g', '_') => Some(Rule::Motion(Motion::LastNonBlank)),
        ('g', 'e') => Some(Rule::Motion(Motion::WordEndBackward { big: false })),
        ('g', 'E') => Some(Rule::Motion(Motion::WordEndBackward { big: true })),
        ('g', '~' | 'u' | 'U') => {
            let op = Operator::from_g_key(c)?;
            if ctx.is_visual() {
                Some(Rule::Alias(op, Target::Visual))
            } else {
                Some(Rule::Operator(op))
            }
        }
        ('g', 'J') if !matches!(ctx, Context::OperatorPending(_)) => {
            Some(Rule::Action(Action::Join { spaces: false }))
        }
        ('g', 'I') if ctx == Context::Normal => {
            Some(Rule::Action(Action::Insert(InsertAt::ColumnZero)))
        }
        ('Z', 'Z') if ctx == Context::Normal => Some(Rule::Action(Action::WriteQuit)),
        ('Z', 'Q') if ctx == Context::Normal => Some(Rule::Action(Action::Quit)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_rule(c: char) -> Option<Rule> {
        lookup(&KeyEvent::plain(c), Context::Normal, false)
    }

    #[test]
    fn test_motions() {
        assert_eq!(normal_rule('w'), Some(Rule::Motion(Motion::WordForward { big: false })));
        assert_eq!(
            lookup(&KeyEvent::plain(code::DOWN), Context::Normal, false),
            Some(Rule::Motion(Motion::Down))
        );
        assert_eq!(
            lookup(&KeyEvent::ctrl('n'), Context::Normal, false),
            Some(Rule::Motion(Motion::Down))
        );
        assert_eq!(
            lookup(&KeyEvent::enter(), Context::Normal, false),
            Some(Rule::Motion(Motion::NextLine))
        );
    }

    #[test]
    fn test_operators_and_aliases() {
        assert_eq!(normal_rule('d'), Some(Rule::Operator(Operator::Delete)));
        assert_eq!(
            normal_rule('x'),
            Some(Rule::Alias(Operator::Delete, Target::Motion(Motion::Right)))
        );
        assert_eq!(normal_rule('Y'), Some(Rule::Alias(Operator::Yank, Target::Line)));
    }

    #[test]
    fn test_context_dependent_keys() {
        assert_eq!(
            normal_rule('i'),
            Some(Rule::Action(Action::Insert(InsertAt::Before)))
        );
        let pending_ctx = Context::OperatorPending(Operator::Delete);
        assert_eq!(
            lookup(&KeyEvent::plain('i'), pending_ctx, false),
            Some(Rule::TextObject(Scope::Inner))
        );
        assert_eq!(lookup(&KeyEvent::plain('p'), pending_ctx, false), None);
        assert_eq!(
            lookup(&KeyEvent::plain('q'), Context::Normal, true),
            Some(Rule::Action(Action::StopRecording))
        );
    }

    #[test]
    fn test_visual_keys() {
        let ctx = Context::Visual(VisualKind::Char);
        assert_eq!(
            lookup(&KeyEvent::plain('x'), ctx, false),
            Some(Rule::Alias(Operator::Delete, Target::Visual))
        );
        assert_eq!(
            lookup(&KeyEvent::plain('o'), ctx, false),
            Some(Rule::Action(Action::SwapVisualEnds))
        );
    }

    #[test]
    fn test_prefixes() {
        let g = |c| lookup_prefix('g', &KeyEvent::plain(c), Context::Normal);
        assert_eq!(g('g'), Some(Rule::Motion(Motion::FirstLine)));
        assert_eq!(g('U'), Some(Rule::Operator(Operator::Uppercase)));
        assert_eq!(g('z'), None);
        assert_eq!(
            lookup_prefix('Z', &KeyEvent::plain('Z'), Context::Normal),
            Some(Rule::Action(Action::WriteQuit))
        );
    }

    #[test]
    fn test_undefined() {
        assert_eq!(normal_rule('\u{1f600}'), None);
        assert_eq!(lookup(&KeyEvent::ctrl('z'), Context::Normal, false), None);
    }
}
