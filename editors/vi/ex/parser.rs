//! Ex command parser.

use super::address::{parse_address, parse_address_range, Address, AddressRange};
use super::command::{lookup_name, CommandLineEntry, ExCommand, SubstituteFlags};
use crate::error::{EngineError, Result};

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidCommandLine(message.into())
}

/// Split a command line into range, command name, force flag and
/// arguments.
pub fn split_command_line(input: &str) -> Result<CommandLineEntry> {
    let input = input.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    let (range, rest) = parse_address_range(input)?;
    let rest = rest.trim_start();

    let (name, rest) = match rest.chars().next() {
        None => (String::new(), ""),
        Some(c @ ('>' | '<')) => {
            let end = rest.find(|ch| ch != c).unwrap_or(rest.len());
            (rest[..end].to_string(), &rest[end..])
        }
        Some(c @ ('&' | '=')) => (c.to_string(), &rest[1..]),
        Some(c) if c.is_ascii_alphabetic() => {
            let end = rest
                .find(|ch: char| !ch.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            let typed = &rest[..end];
            let (full, consumed) = if let Some(full) = lookup_name(typed) {
                (full, end)
            } else if is_substitute_with_flags(typed) {
                ("substitute", 1)
            } else if typed.len() == 2 && typed.starts_with('k') {
                ("k", 1)
            } else {
                return Err(invalid(format!("not an editor command: {}", typed)));
            };
            (full.to_string(), &rest[consumed..])
        }
        Some(_) => return Err(invalid(format!("not an editor command: {}", rest))),
    };

    let (force, args) = match rest.strip_prefix('!') {
        Some(args) => (true, args),
        None => (false, rest),
    };
    Ok(CommandLineEntry {
        range,
        name,
        force,
        args: args.trim().to_string(),
    })
}

/// `:sg` and friends: `s` followed directly by flags.
fn is_substitute_with_flags(typed: &str) -> bool {
    typed.strip_prefix('s').is_some_and(|flags| {
        !flags.is_empty() && flags.chars().all(|c| matches!(c, 'g' | 'i' | 'I' | 'n' | 'p'))
    })
}

fn no_range(range: &AddressRange, cmd: ExCommand) -> Result<Option<ExCommand>> {
    if range.is_explicit() {
        Err(invalid("no range allowed"))
    } else {
        Ok(Some(cmd))
    }
}

/// Parse an ex command string.
pub fn parse_ex_command(input: &str) -> Result<Option<ExCommand>> {
    let entry = split_command_line(input)?;
    interpret(entry)
}

/// Turn a split command line into a command. `None` for an empty line.
pub fn interpret(entry: CommandLineEntry) -> Result<Option<ExCommand>> {
    let CommandLineEntry {
        range,
        name,
        force,
        args,
    } = entry;
    let args = args.as_str();

    let command = match name.as_str() {
        "" => {
            return match range.end.or(range.start) {
                Some(line) => Ok(Some(ExCommand::Goto { line })),
                None => Ok(None),
            }
        }
        "delete" => {
            let (register, count) = parse_register_and_count(args)?;
            ExCommand::Delete {
                range,
                register,
                count,
            }
        }
        "yank" => {
            let (register, count) = parse_register_and_count(args)?;
            ExCommand::Yank {
                range,
                register,
                count,
            }
        }
        "put" => {
            ExCommand::Put {
                line: range.end.or(range.start),
                register: args.chars().next(),
                above: force,
            }
        }
        "copy" | "t" => ExCommand::Copy {
            range,
            dest: parse_destination(args)?,
        },
        "move" => ExCommand::Move {
            range,
            dest: parse_destination(args)?,
        },
        "join" => ExCommand::Join {
            range,
            count: parse_optional_count(args)?,
            spaces: !force,
        },
        "substitute" => parse_substitute(range, args)?,
        "&" => {
            let (flags, rest) = SubstituteFlags::parse(args)?;
            ExCommand::RepeatSubstitute {
                range,
                flags,
                count: parse_optional_count(rest)?,
            }
        }
        "set" => return no_range(&range, ExCommand::Set {
            args: args.to_string(),
        }),
        "undo" => return no_range(&range, ExCommand::Undo),
        "redo" => return no_range(&range, ExCommand::Redo),
        "mark" | "k" => {
            let mut chars = args.chars();
            let name = chars.next().ok_or_else(|| invalid("argument required"))?;
            if chars.next().is_some() {
                return Err(invalid(format!("trailing characters: {}", args)));
            }
            ExCommand::Mark {
                line: range.end.or(range.start),
                name,
            }
        }
        "marks" => return no_range(&range, ExCommand::Marks {
            names: args.to_string(),
        }),
        "registers" | "display" => return no_range(&range, ExCommand::Registers {
            names: args.to_string(),
        }),
        "print" => ExCommand::Print {
            range,
            count: parse_optional_count(args)?,
        },
        "=" => ExCommand::LineNumber {
            line: range.end.or(range.start),
        },
        "write" => ExCommand::Write {
            range,
            file: optional_file(args),
            force,
        },
        "quit" => return no_range(&range, ExCommand::Quit { force }),
        "wq" | "xit" => ExCommand::WriteQuit {
            file: optional_file(args),
            force,
            if_modified: name == "xit",
        },
        shift if shift.starts_with('>') || shift.starts_with('<') => {
            let depth = shift.len();
            let count = parse_optional_count(args)?;
            if shift.starts_with('>') {
                ExCommand::ShiftRight { range, depth, count }
            } else {
                ExCommand::ShiftLeft { range, depth, count }
            }
        }
        other => return Err(invalid(format!("not an editor command: {}", other))),
    };
    Ok(Some(command))
}

fn optional_file(args: &str) -> Option<String> {
    (!args.is_empty()).then(|| args.to_string())
}

/// Parse `s/pattern/replacement/flags count`.
fn parse_substitute(range: AddressRange, args: &str) -> Result<ExCommand> {
    let delim = args
        .chars()
        .next()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '\\' | '"' | '|' | '&'));
    let Some(delim) = delim else {
        // `:s` or `:s g`: repeat with new flags.
        let (flags, rest) = SubstituteFlags::parse(args)?;
        return Ok(ExCommand::RepeatSubstitute {
            range,
            flags,
            count: parse_optional_count(rest)?,
        });
    };

    let body = &args[delim.len_utf8()..];
    let (pattern, rest) = split_delimited(body, delim);
    let (replacement, rest) = match rest {
        Some(rest) => split_delimited(rest, delim),
        None => (String::new(), None),
    };
    let (flags, rest) = SubstituteFlags::parse(rest.unwrap_or("").trim_start())?;

    Ok(ExCommand::Substitute {
        range,
        pattern,
        replacement,
        flags,
        count: parse_optional_count(rest)?,
    })
}

/// Text up to an unescaped `delim`, and what follows the delimiter if one
/// was found.
fn split_delimited(input: &str, delim: char) -> (String, Option<&str>) {
    let mut text = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == delim {
            return (text, Some(&input[i + c.len_utf8()..]));
        }
        if c == '\\' {
            match chars.next() {
                Some((_, next)) if next == delim => text.push(next),
                Some((_, next)) => {
                    text.push('\\');
                    text.push(next);
                }
                None => text.push('\\'),
            }
            continue;
        }
        text.push(c);
    }
    (text, None)
}

/// Parse register and count from args.
fn parse_register_and_count(args: &str) -> Result<(Option<char>, Option<usize>)> {
    let args = args.trim();
    let Some(first) = args.chars().next() else {
        return Ok((None, None));
    };

    if first.is_ascii_digit() {
        return Ok((None, parse_optional_count(args)?));
    }
    let rest = &args[first.len_utf8()..];
    Ok((Some(first), parse_optional_count(rest)?))
}

/// Parse optional count.
fn parse_optional_count(args: &str) -> Result<Option<usize>> {
    let args = args.trim();
    if args.is_empty() {
        return Ok(None);
    }
    match args.parse::<usize>() {
        Ok(0) => Err(invalid("positive count required")),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(invalid(format!("trailing characters: {}", args))),
    }
}

/// Parse the destination address of `:copy` and `:move`.
fn parse_destination(args: &str) -> Result<Address> {
    match parse_address(args)? {
        Some((addr, rest)) if rest.trim().is_empty() => Ok(addr),
        Some((_, rest)) => Err(invalid(format!("trailing characters: {}", rest.trim()))),
        None => Err(invalid("destination address required")),
    }
}
