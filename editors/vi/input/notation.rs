//! `<...>` key notation.
//!
//! `3dw<Esc>` or `"ayy"ap` style strings, as written in vi documentation.
//! Unknown `<...>` groups are taken literally, starting with the `<`.

use super::key::{code, special_name, KeyEvent, Modifiers};

/// Parse a key script into key events.
pub fn parse_keys(script: &str) -> Vec<KeyEvent> {
    let chars: Vec<char> = script.chars().collect();
    let mut keys = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '<' {
            if let Some(close) = chars[i + 1..].iter().position(|&c| c == '>') {
                let inner: String = chars[i + 1..i + 1 + close].iter().collect();
                if let Some(key) = parse_group(&inner) {
                    keys.push(key);
                    i += close + 2;
                    continue;
                }
            }
        }
        keys.push(KeyEvent::plain(chars[i]));
        i += 1;
    }

    keys
}

/// Render key events back into notation.
pub fn format_keys(keys: &[KeyEvent]) -> String {
    keys.iter().map(|k| k.to_string()).collect()
}

fn parse_group(inner: &str) -> Option<KeyEvent> {
    if inner.is_empty() {
        return None;
    }

    let mut modifiers = Modifiers::NONE;
    let mut rest = inner;
    loop {
        let mut chars = rest.chars();
        let (Some(m), Some('-')) = (chars.next(), chars.next()) else {
            break;
        };
        if chars.as_str().is_empty() {
            break;
        }
        match m.to_ascii_uppercase() {
            'S' => modifiers.shift = true,
            'C' => modifiers.control = true,
            'M' | 'A' => modifiers.option = true,
            'D' => modifiers.command = true,
            _ => return None,
        }
        rest = chars.as_str();
    }

    let mut chars = rest.chars();
    if let (Some(c), None) = (chars.next(), chars.clone().next()) {
        if modifiers.is_empty() {
            return None;
        }
        return Some(KeyEvent::new(c, modifiers));
    }

    let code = named_key(rest)?;
    Some(KeyEvent::new(code, modifiers))
}

fn named_key(name: &str) -> Option<char> {
    let lower = name.to_ascii_lowercase();
    let c = match lower.as_str() {
        "esc" => code::ESCAPE,
        "cr" | "enter" | "return" => code::ENTER,
        "bs" | "backspace" => code::BACKSPACE,
        "del" | "delete" => code::DELETE,
        "bar" => '|',
        "bslash" => '\\',
        "nl" => code::ENTER,
        _ => {
            if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
                if (1..=35).contains(&n) {
                    return char::from_u32(code::F1 as u32 + n - 1);
                }
                return None;
            }
            return all_special().find(|&c| {
                special_name(c).is_some_and(|s| s.eq_ignore_ascii_case(name))
            });
        }
    };
    Some(c)
}

fn all_special() -> impl Iterator<Item = char> {
    [
        code::TAB,
        code::UP,
        code::DOWN,
        code::LEFT,
        code::RIGHT,
        code::INSERT,
        code::HOME,
        code::END,
        code::PAGE_UP,
        code::PAGE_DOWN,
        ' ',
        '<',
    ]
    .into_iter()
}
