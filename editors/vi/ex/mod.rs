//! Ex command line parsing.
//!
//! A committed `:` line is split into an optional range, a command name
//! (unambiguous abbreviations allowed) and its arguments, then interpreted
//! into an [`ExCommand`]. Running the command is the executor's job.

pub mod address;
pub mod command;
pub mod parser;

pub use address::{Address, AddressBase, AddressContext, AddressRange};
pub use command::{CommandLineEntry, ExCommand, HostRequest, SubstituteFlags};
pub use parser::{parse_ex_command, split_command_line};
