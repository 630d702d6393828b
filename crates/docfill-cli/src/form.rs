//! Interactive terminal form
//!
//! Prompts for every field in label order. Pressing Enter keeps the current
//! value; required fields are asked again until they are filled or input
//! ends.

use std::io::{BufRead, Write};

use chrono::{Datelike, Local, NaiveDate};
use docfill_core::{FieldDefinition, FieldInput, FieldModel, FormRenderer, FormState};

/// [`FormRenderer`] reading answers line by line
pub struct TerminalForm<R, W> {
    input: R,
    output: W,
    current_year: i32,
}

impl<R: BufRead, W: Write> TerminalForm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            current_year: Local::now().year(),
        }
    }

    /// Year assumed when a date is entered as `D/M`
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Next line without its terminator, or `None` at end of input
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Lines up to the first empty one, joined with `\n`
    fn read_block(&mut self) -> std::io::Result<Option<String>> {
        let mut lines = Vec::new();
        loop {
            match self.read_line()? {
                Some(line) if !line.is_empty() => lines.push(line),
                Some(_) => break,
                None if lines.is_empty() => return Ok(None),
                None => break,
            }
        }
        Ok(Some(lines.join("\n")))
    }

    fn prompt(&mut self, def: &FieldDefinition, input: &FieldInput) -> std::io::Result<()> {
        let marker = if def.required { "*" } else { "" };
        match input {
            FieldInput::Choice { options, selected } => {
                writeln!(self.output, "{}{}:", def.label, marker)?;
                for (i, option) in options.iter().enumerate() {
                    writeln!(self.output, "  {}) {}", i + 1, option)?;
                }
                write!(self.output, "Choice")?;
                if let Some(selected) = selected {
                    write!(self.output, " [{}]", selected)?;
                }
                write!(self.output, ": ")?;
            }
            FieldInput::Date { .. } => {
                write!(self.output, "{}{} (DD/MM/YYYY)", def.label, marker)?;
                write_current(&mut self.output, &input.resolve())?;
            }
            FieldInput::Text {
                multiline: true, ..
            } => {
                writeln!(
                    self.output,
                    "{}{} (end with an empty line, empty to keep)",
                    def.label, marker
                )?;
                let current = input.resolve();
                if !current.is_empty() {
                    writeln!(self.output, "[{}]", current)?;
                }
            }
            FieldInput::Text { .. } => {
                write!(self.output, "{}{}", def.label, marker)?;
                write_current(&mut self.output, &input.resolve())?;
            }
        }
        self.output.flush()
    }

    /// Ask for one field until the answer is acceptable or input ends
    fn ask(&mut self, def: &FieldDefinition, form: &mut FormState) -> std::io::Result<()> {
        loop {
            let Some(input) = form.input_mut(&def.id) else {
                return Ok(());
            };
            let snapshot = input.clone();
            self.prompt(def, &snapshot)?;

            let answer = match snapshot {
                FieldInput::Text {
                    multiline: true, ..
                } => self.read_block()?,
                _ => self.read_line()?,
            };
            let Some(answer) = answer else {
                writeln!(self.output)?;
                return Ok(());
            };

            if let Err(message) = apply_answer(input, &answer, self.current_year) {
                writeln!(self.output, "{}", message)?;
                continue;
            }
            if def.required && input.is_blank() {
                writeln!(self.output, "This field is required.")?;
                continue;
            }
            return Ok(());
        }
    }
}

impl<R: BufRead, W: Write> FormRenderer for TerminalForm<R, W> {
    fn fill(&mut self, model: &FieldModel, form: &mut FormState) -> docfill_core::Result<()> {
        for def in model.sorted_by_label() {
            self.ask(def, form)?;
        }
        Ok(())
    }
}

fn write_current<W: Write>(out: &mut W, current: &str) -> std::io::Result<()> {
    if current.is_empty() {
        write!(out, ": ")
    } else {
        write!(out, " [{}]: ", current)
    }
}

/// Apply a typed answer; an empty answer keeps the current value
fn apply_answer(input: &mut FieldInput, answer: &str, current_year: i32) -> Result<(), String> {
    if answer.trim().is_empty() {
        return Ok(());
    }

    match input {
        FieldInput::Text { .. } => {
            input.assign(answer);
            Ok(())
        }
        FieldInput::Choice { options, selected } => {
            let answer = answer.trim();
            let chosen = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
                .or_else(|| options.iter().find(|o| o.eq_ignore_ascii_case(answer)))
                .cloned();
            match chosen {
                Some(option) => {
                    *selected = Some(option);
                    Ok(())
                }
                None => Err(format!("Choose a number from 1 to {}.", options.len())),
            }
        }
        FieldInput::Date { .. } => {
            let date = parse_date(answer.trim(), current_year)
                .ok_or_else(|| "Enter a date as DD/MM/YYYY.".to_string())?;
            input.assign(&date.format("%d/%m/%Y").to_string());
            Ok(())
        }
    }
}

/// `D/M/Y`, or `D/M` in `current_year`
fn parse_date(text: &str, current_year: i32) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split('/').map(str::trim).collect();
    let (day, month, year) = match parts.as_slice() {
        [d, m] => (d.parse().ok()?, m.parse().ok()?, current_year),
        [d, m, y] => (d.parse().ok()?, m.parse().ok()?, y.parse().ok()?),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}
