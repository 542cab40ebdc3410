//! vi-replay - run a vi key script against a file
//!
//! Reads the text from FILE (or standard input), feeds the keys through a
//! headless engine and writes the resulting text to standard output.

use clap::Parser;
use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vi_engine::{Buffer, Engine, HostRequest, Message, RegisterKind, RegisterStore, StatusLine, SurfaceExt};

/// vi-replay - replay vi keystrokes against a text.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Keys to replay, in key notation (`<Esc>`, `<CR>`, `<C-r>`, ...).
    #[arg(short, long, conflicts_with = "script")]
    keys: Option<String>,

    /// Read the keys from a file instead.
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Print the register table after the text.
    #[arg(short, long)]
    registers: bool,

    /// Print status and error messages to standard error.
    #[arg(short, long)]
    messages: bool,

    /// Set options before replaying, as with `:set`.
    #[arg(short = 'o', long = "set")]
    set: Vec<String>,

    /// Text to edit; standard input when absent.
    file: Option<PathBuf>,
}

fn read_input(file: Option<&PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn kind_name(kind: RegisterKind) -> &'static str {
    match kind {
        RegisterKind::Character => "c",
        RegisterKind::Line => "l",
        RegisterKind::Block => "b",
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let keys = match (&args.keys, &args.script) {
        (Some(keys), _) => keys.clone(),
        (None, Some(script)) => fs::read_to_string(script)?.trim_end_matches('\n').to_string(),
        (None, None) => String::new(),
    };
    let text = read_input(args.file.as_ref())?;

    let status = StatusLine::shared();
    let mut engine = Engine::new(Buffer::from_text(&text), RegisterStore::shared()).with_feedback(status.clone());
    for arg in &args.set {
        engine.options_mut().set_line(arg)?;
    }

    let outcomes = engine.feed(&keys);
    info!(keys = outcomes.len(), mode = %engine.mode(), "replay finished");

    for request in engine.take_requests() {
        match request {
            HostRequest::Write { file: Some(path), lines, .. } => {
                let body = engine.surface().text();
                let body: Vec<&str> = match lines {
                    Some((first, last)) => body
                        .lines()
                        .skip(first.saturating_sub(1))
                        .take((last + 1).saturating_sub(first.max(1)))
                        .collect(),
                    None => body.lines().collect(),
                };
                let mut out = body.join("\n");
                out.push('\n');
                fs::write(&path, out)?;
            }
            other => warn!(?other, "host request ignored"),
        }
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(engine.surface().text().as_bytes())?;

    if args.registers {
        writeln!(stdout)?;
        for entry in engine.registers().borrow().entries() {
            writeln!(stdout, "\"{} {} {:?}", entry.name, kind_name(entry.kind), entry.content)?;
        }
    }

    if args.messages {
        for message in status.borrow().messages() {
            match message {
                Message::Error { text, .. } => eprintln!("E: {}", text),
                Message::Status(text) => eprintln!("{}", text),
            }
        }
    }

    Ok(())
}
