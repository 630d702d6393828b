//! docfill CLI - Command-line interface library
//!
//! This library provides the CLI functionality for docfill:
//! - List: show discovered templates
//! - Fields: show the merged form of a template selection
//! - Check: find placeholders missing from templates
//! - Generate: fill templates and write documents
//!
//! # Binary Usage
//!
//! ```bash
//! # Which templates are there?
//! docfill list
//!
//! # Fill two templates, prompting for anything not given
//! docfill generate certificate declaration --values answers.json --output out/
//!
//! # Non-interactive, e.g. from a script
//! docfill generate certificate --set "[student name]=Ana Lima" --no-interactive
//! ```

pub mod app;
pub mod form;

// Re-export main entry point and types
pub use app::{
    check_command, execute, fields_command, generate_command, list_command, run_cli, Cli,
    Commands, GenerateArgs, OutputFormat,
};
pub use form::TerminalForm;
