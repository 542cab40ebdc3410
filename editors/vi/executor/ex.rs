//! Running ex commands.

use super::{Executor, SubstituteRecord, Transition};
use crate::command::operator::{self, delete_lines, join_lines};
use crate::command::{EditContext, Operator, Region};
use crate::error::{EngineError, Result};
use crate::ex::{parse_ex_command, Address, AddressContext, AddressRange, ExCommand, HostRequest, SubstituteFlags};
use crate::marks::PREVIOUS_CONTEXT;
use crate::register::{RegisterEntry, RegisterKind};
use crate::search::{self, Substitution};
use crate::surface::SurfaceExt;
use tracing::debug;

impl Executor<'_> {
    /// Parse and run one `:` line.
    pub fn run_ex(&mut self, line: &str) -> Result<Transition> {
        let Some(command) = parse_ex_command(line)? else {
            return Ok(Transition::Stay);
        };
        debug!(?command, "ex command");
        self.ex_command(command)
    }

    fn address_context(&self) -> AddressContext<'_> {
        AddressContext {
            surface: &*self.surface,
            marks: &self.state.marks,
            options: &*self.options,
            last_pattern: self.state.search.pattern.as_deref(),
        }
    }

    fn current_line(&self) -> usize {
        self.surface.line_of(self.surface.cursor())
    }

    fn lines_of(&self, range: &AddressRange) -> Result<(usize, usize)> {
        range.resolve(&self.address_context(), self.current_line())
    }

    /// 1-based line number of an address; `0` is "above the first line".
    fn line_number(&self, address: &Address) -> Result<usize> {
        address.resolve_number(&self.address_context(), self.current_line())
    }

    /// With a count, the command covers `count` lines from the last line of
    /// the range.
    fn counted(&self, (first, last): (usize, usize), count: Option<usize>) -> (usize, usize) {
        match count {
            Some(n) => (last, (last + n - 1).min(self.surface.last_line())),
            None => (first, last),
        }
    }

    fn ex_command(&mut self, command: ExCommand) -> Result<Transition> {
        match command {
            ExCommand::Goto { line } => {
                let target = self.line_number(&line)?.max(1) - 1;
                let cursor = self.surface.cursor();
                self.state.marks.set_internal(PREVIOUS_CONTEXT, cursor);
                self.surface.set_cursor(self.surface.first_non_blank(target));
            }
            ExCommand::Delete {
                range,
                register,
                count,
            } => {
                let (first, last) = self.counted(self.lines_of(&range)?, count);
                self.lines_operator(Operator::Delete, first, last, register, 1)?;
                self.state.modified = true;
            }
            ExCommand::Yank {
                range,
                register,
                count,
            } => {
                let (first, last) = self.counted(self.lines_of(&range)?, count);
                let cursor = self.surface.cursor();
                self.lines_operator(Operator::Yank, first, last, register, 1)?;
                self.surface.set_cursor(cursor);
            }
            ExCommand::Put {
                line,
                register,
                above,
            } => {
                let number = match &line {
                    Some(address) => self.line_number(address)?,
                    None => self.current_line() + 1,
                };
                let entry = self.registers.require(register.unwrap_or('"'))?;
                let entry = RegisterEntry::new(entry.name, entry.content.clone(), RegisterKind::Line);
                self.put_lines(&entry, number, above)?;
            }
            ExCommand::Copy { range, dest } => {
                let (first, last) = self.lines_of(&range)?;
                let number = self.line_number(&dest)?;
                let (text, _) = Region::Lines { first, last }.text(&*self.surface);
                let entry = RegisterEntry::new('"', text, RegisterKind::Line);
                let top = self.put_lines(&entry, number, false)?;
                let end = top + (last - first);
                self.surface.set_cursor(self.surface.first_non_blank(end));
            }
            ExCommand::Move { range, dest } => {
                let (first, last) = self.lines_of(&range)?;
                let number = self.line_number(&dest)?;
                self.move_lines(first, last, number)?;
            }
            ExCommand::Join {
                range,
                count,
                spaces,
            } => {
                let (first, last) = self.lines_of(&range)?;
                let (first, lines) = match count {
                    Some(n) => (last, n),
                    None if first == last => (first, 2),
                    None => (first, last - first + 1),
                };
                let cursor = self.grouped(|ex| join_lines(&mut ex.edit(), first, lines, spaces))?;
                self.surface.set_cursor(cursor);
                self.state.modified = true;
            }
            ExCommand::ShiftRight { range, depth, count } => {
                self.shift(range, depth, count, Operator::ShiftRight)?;
            }
            ExCommand::ShiftLeft { range, depth, count } => {
                self.shift(range, depth, count, Operator::ShiftLeft)?;
            }
            ExCommand::Substitute {
                range,
                pattern,
                replacement,
                flags,
                count,
            } => {
                self.substitute(&range, &pattern, &replacement, flags, count)?;
            }
            ExCommand::RepeatSubstitute { range, flags, count } => {
                let previous = self
                    .state
                    .last_substitute
                    .clone()
                    .ok_or(EngineError::NoPreviousSubstitution)?;
                let flags = flags.merged(previous.flags);
                self.substitute(&range, &previous.pattern, &previous.replacement, flags, count)?;
            }
            ExCommand::Set { args } => {
                if let Some(message) = self.options.set_line(&args)? {
                    self.status(&message);
                }
            }
            ExCommand::Undo => {
                self.undo(1)?;
            }
            ExCommand::Redo => {
                self.redo(1)?;
            }
            ExCommand::Mark { line, name } => {
                let target = match &line {
                    Some(address) => address.resolve(&self.address_context(), self.current_line())?,
                    None => self.current_line(),
                };
                let offset = self.surface.line_start(target);
                self.state.marks.set(name, offset)?;
            }
            ExCommand::Marks { names } => self.list_marks(&names)?,
            ExCommand::Registers { names } => self.list_registers(&names),
            ExCommand::Print { range, count } => {
                let (first, last) = self.counted(self.lines_of(&range)?, count);
                let text: Vec<String> = (first..=last).map(|line| self.surface.line_text(line)).collect();
                self.status(&text.join("\n"));
                self.surface.set_cursor(self.surface.first_non_blank(last));
            }
            ExCommand::LineNumber { line } => {
                let number = match &line {
                    Some(address) => self.line_number(address)?,
                    None => self.surface.line_count(),
                };
                self.status(&number.to_string());
            }
            ExCommand::Write { range, file, force } => {
                let lines = if range.is_explicit() {
                    let (first, last) = self.lines_of(&range)?;
                    Some((first + 1, last + 1))
                } else {
                    None
                };
                if lines.is_none() && file.is_none() {
                    self.state.modified = false;
                }
                self.state.requests.push(HostRequest::Write { file, lines, force });
            }
            ExCommand::Quit { force } => {
                if self.state.modified && !force {
                    return Err(EngineError::InvalidCommandLine(
                        "no write since last change (add ! to override)".to_string(),
                    ));
                }
                self.state.requests.push(HostRequest::Quit { force });
            }
            ExCommand::WriteQuit {
                file,
                force,
                if_modified,
            } => {
                self.state.modified = false;
                self.state.requests.push(HostRequest::WriteQuit {
                    file,
                    force,
                    if_modified,
                });
            }
        }
        Ok(Transition::Stay)
    }

    /// Run a linewise operator over `first..=last`.
    fn lines_operator(
        &mut self,
        op: Operator,
        first: usize,
        last: usize,
        register: Option<char>,
        shift_count: usize,
    ) -> Result<()> {
        let region = Region::Lines { first, last };
        self.surface.begin_undo_group();
        let result = {
            let mut ed = EditContext::new(&mut *self.surface, &mut self.state.marks);
            operator::apply(
                op,
                &mut ed,
                &region,
                &mut *self.registers,
                register,
                &*self.options,
                shift_count,
            )
        };
        self.surface.end_undo_group();
        let result = result?;
        self.surface.set_cursor(result.cursor);
        self.report_lines(op, &region, shift_count);
        Ok(())
    }

    fn shift(&mut self, range: AddressRange, depth: usize, count: Option<usize>, op: Operator) -> Result<()> {
        let (first, last) = self.counted(self.lines_of(&range)?, count);
        self.lines_operator(op, first, last, None, depth)?;
        self.surface.set_cursor(self.surface.first_non_blank(last));
        self.state.modified = true;
        Ok(())
    }

    /// Put `entry` as lines below 1-based line `number` (above it with
    /// `above`, above the first line for `0`). Returns the first new line.
    fn put_lines(&mut self, entry: &RegisterEntry, number: usize, above: bool) -> Result<usize> {
        let (line, after) = match number {
            0 => (0, false),
            n => (n - 1, !above),
        };
        let start = self.surface.line_start(line);
        self.surface.set_cursor(start);
        let cursor = self.grouped(|ex| operator::put(&mut ex.edit(), entry, after, 1))?;
        self.surface.set_cursor(cursor);
        self.state.modified = true;
        Ok(self.surface.line_of(cursor))
    }

    /// `:m`: lines `first..=last` go below 1-based line `number`.
    fn move_lines(&mut self, first: usize, last: usize, number: usize) -> Result<()> {
        if number > first && number <= last {
            return Err(EngineError::InvalidRange(
                "cannot move lines into themselves".to_string(),
            ));
        }
        let (text, _) = Region::Lines { first, last }.text(&*self.surface);
        let entry = RegisterEntry::new('"', text, RegisterKind::Line);
        let moved = last - first + 1;
        let end = self.grouped(|ex| {
            if number > last {
                let (line, after) = (number - 1, true);
                ex.surface.set_cursor(ex.surface.line_start(line));
                operator::put(&mut ex.edit(), &entry, after, 1)?;
                delete_lines(&mut ex.edit(), first, last)?;
                Ok(number - 1)
            } else {
                delete_lines(&mut ex.edit(), first, last)?;
                let (line, after) = if number == 0 { (0, false) } else { (number - 1, true) };
                ex.surface.set_cursor(ex.surface.line_start(line));
                operator::put(&mut ex.edit(), &entry, after, 1)?;
                Ok(number + moved - 1)
            }
        })?;
        self.surface.set_cursor(self.surface.first_non_blank(end));
        self.state.modified = true;
        Ok(())
    }

    fn substitute(
        &mut self,
        range: &AddressRange,
        pattern: &str,
        replacement: &str,
        flags: SubstituteFlags,
        count: Option<usize>,
    ) -> Result<()> {
        let (first, last) = self.counted(self.lines_of(range)?, count);
        let pattern = if pattern.is_empty() {
            self.state.search.pattern()?.to_string()
        } else {
            pattern.to_string()
        };

        let mut options = self.options.clone();
        if flags.ignore_case {
            options.ignorecase = true;
            options.smartcase = false;
        }
        if flags.match_case {
            options.ignorecase = false;
        }
        let substitution = Substitution::new(search::compile(&pattern, &options)?, replacement, flags.global);

        self.state.search.pattern = Some(pattern.clone());
        self.registers.set_read_only('/', &pattern);
        self.state.last_substitute = Some(SubstituteRecord {
            pattern: pattern.clone(),
            replacement: replacement.to_string(),
            flags: SubstituteFlags { keep: false, ..flags },
        });

        let mut total = 0;
        let mut edits = Vec::new();
        for line in first..=last {
            let (text, n) = substitution.apply_line(&self.surface.line_text(line));
            if n > 0 {
                total += n;
                edits.push((line, text));
            }
        }
        if total == 0 {
            return Err(EngineError::PatternNotFound(pattern));
        }
        if flags.count {
            self.status(&format!("{} matches on {} lines", total, edits.len()));
            return Ok(());
        }

        self.grouped(|ex| {
            // bottom up so earlier line numbers stay valid
            for (line, text) in edits.iter().rev() {
                let range = ex.surface.line_range(*line);
                ex.edit().replace(range, text)?;
            }
            Ok(())
        })?;
        self.state.modified = true;

        let added: usize = edits.iter().map(|(_, text)| text.matches('\n').count()).sum();
        let last_changed = edits.last().map_or(first, |(line, _)| *line) + added;
        let target = last_changed.min(self.surface.last_line());
        self.surface.set_cursor(self.surface.first_non_blank(target));
        if flags.print {
            let text = self.surface.line_text(target);
            self.status(&text);
        }
        if edits.len() > 2 {
            self.status(&format!("{} substitutions on {} lines", total, edits.len()));
        }
        Ok(())
    }

    fn list_marks(&mut self, names: &str) -> Result<()> {
        let s = &*self.surface;
        let len = s.len_chars();
        let mut lines = vec!["mark line  col text".to_string()];
        for (name, offset) in self.state.marks.entries() {
            if !names.is_empty() && !names.contains(name) {
                continue;
            }
            let offset = offset.min(len);
            let line = s.line_of(offset);
            lines.push(format!(
                " {}  {:>5} {:>4} {}",
                name,
                line + 1,
                s.column_of(offset),
                s.line_text(line)
            ));
        }
        if lines.len() == 1 {
            let missing = names.chars().next().unwrap_or('a');
            return Err(EngineError::MarkNotSet(missing));
        }
        self.status(&lines.join("\n"));
        Ok(())
    }

    fn list_registers(&mut self, names: &str) {
        let mut lines = vec!["Type Name Content".to_string()];
        for entry in self.registers.entries() {
            if !names.is_empty() && !names.contains(entry.name) {
                continue;
            }
            let kind = match entry.kind {
                RegisterKind::Character => 'c',
                RegisterKind::Line => 'l',
                RegisterKind::Block => 'b',
            };
            lines.push(format!(
                "  {}  \"{}   {}",
                kind,
                entry.name,
                entry.content.replace('\n', "^J")
            ));
        }
        self.status(&lines.join("\n"));
    }
}
