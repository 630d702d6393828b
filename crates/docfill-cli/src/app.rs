//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;

use docfill_core::{
    check_template, FieldDefinition, FieldKind, FieldModel, FieldValueSet, GenerationObserver,
    GenerationOutcome, MetadataStatus, Session, Settings, TemplateDescriptor,
};

use crate::form::TerminalForm;

/// Output format for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for scripts
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "docfill")]
#[command(author, version, about = "Fill Word templates from a form", long_about = None)]
pub struct Cli {
    /// Configuration file (default: docfill.toml in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Templates directory (default: auto-discovered)
    #[arg(long = "templates", value_name = "DIR", global = true)]
    pub templates_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List discovered templates and their metadata
    List {
        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the merged fields of one or more templates
    Fields {
        /// Template file names or base names
        #[arg(value_name = "TEMPLATE", required = true)]
        templates: Vec<String>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Report placeholders missing from templates and overlapping identifiers
    Check {
        /// Template file names or base names (default: all)
        #[arg(value_name = "TEMPLATE")]
        templates: Vec<String>,
    },

    /// Fill templates and write the documents
    Generate {
        /// Template file names or base names
        #[arg(value_name = "TEMPLATE", required = true)]
        templates: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON value file to pre-fill the form
        #[arg(long)]
        values: Option<PathBuf>,

        /// Field value, as ID=VALUE (repeatable)
        #[arg(long = "set", value_name = "ID=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Field whose value names the output files
        #[arg(long)]
        key_field: Option<String>,

        /// Save the final values to this JSON file
        #[arg(long)]
        save_values: Option<PathBuf>,

        /// Do not prompt; fail if required fields are blank
        #[arg(long)]
        no_interactive: bool,
    },
}

/// Parse an `ID=VALUE` assignment; the value may contain `=`
fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((id, value)) if !id.is_empty() => Ok((id.to_string(), value.to_string())),
        _ => Err(format!("expected ID=VALUE, got \"{}\"", s)),
    }
}

/// Run the CLI application
///
/// Parses arguments, sets up logging and runs the command against the
/// current directory, stdin and stdout.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    execute(cli, &cwd, &mut stdin.lock(), &mut stdout.lock())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    // Ignore a second initialisation (tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(io::stderr)
        .try_init();
}

/// Run a parsed command
pub fn execute<R: BufRead, W: Write>(
    cli: Cli,
    cwd: &Path,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let session = open_session(cli.config.as_deref(), cli.templates_dir.as_deref(), cwd)?;

    match cli.command {
        Commands::List { format } => list_command(&session, format, out),
        Commands::Fields { templates, format } => {
            fields_command(&session, &templates, format, out)
        }
        Commands::Check { templates } => check_command(&session, &templates, out),
        Commands::Generate {
            templates,
            output,
            values,
            set,
            key_field,
            save_values,
            no_interactive,
        } => generate_command(
            &session,
            GenerateArgs {
                templates,
                output: output.map(|p| absolutize(cwd, p)),
                values: values.map(|p| absolutize(cwd, p)),
                set,
                key_field,
                save_values: save_values.map(|p| absolutize(cwd, p)),
                interactive: !no_interactive,
            },
            input,
            out,
        ),
    }
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// Load settings and scan for templates
fn open_session(config: Option<&Path>, templates: Option<&Path>, cwd: &Path) -> Result<Session> {
    let mut settings = match config {
        Some(path) => {
            let path = absolutize(cwd, path.to_path_buf());
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Settings::load(&path)?
        }
        None => Settings::discover(cwd)?,
    };
    if let Some(dir) = templates {
        settings.paths.templates = Some(absolutize(cwd, dir.to_path_buf()));
    }
    debug!(?settings, "Effective settings");

    Ok(Session::discover(settings, cwd))
}

fn write_notices<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    for notice in session.registry().notices() {
        writeln!(out, "Warning: {}", notice)?;
    }
    Ok(())
}

// =============================================================================
// list
// =============================================================================

#[derive(Serialize)]
struct TemplateEntry<'a> {
    name: &'a str,
    path: String,
    metadata: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<&'a str>,
    fields: usize,
}

impl<'a> TemplateEntry<'a> {
    fn new(template: &'a TemplateDescriptor) -> Self {
        let (metadata, metadata_file, problem, fields) = match &template.metadata {
            MetadataStatus::Loaded(meta) => (
                "loaded",
                Some(meta.source.display().to_string()),
                None,
                meta.fields.len(),
            ),
            MetadataStatus::Missing => ("missing", None, None, 0),
            MetadataStatus::Invalid { path, reason } => (
                "invalid",
                Some(path.display().to_string()),
                Some(reason.as_str()),
                0,
            ),
        };
        Self {
            name: &template.name,
            path: template.path.display().to_string(),
            metadata,
            metadata_file,
            problem,
            fields,
        }
    }
}

/// Execute the list command
pub fn list_command<W: Write>(session: &Session, format: OutputFormat, out: &mut W) -> Result<()> {
    let entries: Vec<TemplateEntry> = session
        .registry()
        .templates()
        .iter()
        .map(TemplateEntry::new)
        .collect();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&entries)
                .context("Failed to serialize template list to JSON")?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Text => {
            write_notices(session, out)?;
            if let Some(dir) = session.registry().templates_dir() {
                writeln!(out, "Templates in {}:", dir.display())?;
            }
            for entry in &entries {
                let status = match (entry.metadata, entry.problem) {
                    ("loaded", _) => format!("{} field(s)", entry.fields),
                    (_, Some(problem)) => format!("invalid metadata: {}", problem),
                    _ => "no metadata".to_string(),
                };
                writeln!(out, "  {:<40} {}", entry.name, status)?;
            }
        }
    }
    Ok(())
}

// =============================================================================
// fields
// =============================================================================

#[derive(Serialize)]
struct FieldEntry<'a> {
    id: &'a str,
    label: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    required: bool,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    options: &'a [String],
}

impl<'a> From<&'a FieldDefinition> for FieldEntry<'a> {
    fn from(def: &'a FieldDefinition) -> Self {
        let options: &[String] = match &def.kind {
            FieldKind::Choice { options } => options,
            _ => &[],
        };
        Self {
            id: &def.id,
            label: &def.label,
            kind: def.kind.name(),
            required: def.required,
            options,
        }
    }
}

/// Execute the fields command
pub fn fields_command<W: Write>(
    session: &Session,
    templates: &[String],
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let selection = session.select(templates)?;
    let fields: Vec<FieldEntry> = selection
        .model()
        .sorted_by_label()
        .into_iter()
        .map(FieldEntry::from)
        .collect();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&fields)
                .context("Failed to serialize fields to JSON")?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Text => {
            for field in &fields {
                let marker = if field.required { "*" } else { " " };
                writeln!(
                    out,
                    "{} {:<30} {:<8} {}",
                    marker, field.label, field.kind, field.id
                )?;
                if !field.options.is_empty() {
                    writeln!(out, "    options: {}", field.options.join(", "))?;
                }
            }
            writeln!(out)?;
            writeln!(out, "{} field(s), * = required", fields.len())?;
        }
    }
    Ok(())
}

// =============================================================================
// check
// =============================================================================

/// Execute the check command
pub fn check_command<W: Write>(session: &Session, templates: &[String], out: &mut W) -> Result<()> {
    write_notices(session, out)?;
    let selected = if templates.is_empty() {
        session.registry().templates().to_vec()
    } else {
        session.registry().select(templates)?
    };

    let mut issues = 0;
    for template in &selected {
        let check = match check_template(template) {
            Ok(check) => check,
            Err(e) => {
                writeln!(out, "✗ {}: {}", template.name, e)?;
                issues += 1;
                continue;
            }
        };

        if check.is_clean() {
            writeln!(out, "✓ {}", check.template)?;
            continue;
        }

        writeln!(out, "✗ {}", check.template)?;
        for id in &check.missing_placeholders {
            writeln!(out, "    placeholder not found: {}", id)?;
        }
        for (short, long) in &check.overlapping {
            writeln!(out, "    \"{}\" is part of \"{}\"", short, long)?;
        }
        issues += check.missing_placeholders.len() + check.overlapping.len();
    }

    if issues > 0 {
        writeln!(out)?;
        writeln!(out, "Found {} issue(s)", issues)?;
    }
    Ok(())
}

// =============================================================================
// generate
// =============================================================================

/// Options of the generate command
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    pub templates: Vec<String>,
    pub output: Option<PathBuf>,
    pub values: Option<PathBuf>,
    pub set: Vec<(String, String)>,
    pub key_field: Option<String>,
    pub save_values: Option<PathBuf>,
    pub interactive: bool,
}

/// Prints one line per template as generation proceeds
struct ProgressPrinter<'a, W: Write> {
    out: &'a mut W,
}

impl<W: Write> GenerationObserver for ProgressPrinter<'_, W> {
    fn on_start(&mut self, index: usize, total: usize, template: &TemplateDescriptor) {
        let _ = writeln!(self.out, "[{}/{}] {}", index + 1, total, template.name);
    }

    fn on_finish(&mut self, outcome: &GenerationOutcome) {
        let _ = match outcome {
            GenerationOutcome::Generated { output, .. } => {
                writeln!(self.out, "  Created: {}", output.display())
            }
            GenerationOutcome::Failed { error, .. } => writeln!(self.out, "  Failed: {}", error),
        };
    }
}

fn write_review<W: Write>(out: &mut W, model: &FieldModel, values: &FieldValueSet) -> Result<()> {
    writeln!(out, "Review:")?;
    for def in model.sorted_by_label() {
        let value = values.get(&def.id).unwrap_or_default();
        let mut lines = value.lines();
        writeln!(out, "  {}: {}", def.label, lines.next().unwrap_or_default())?;
        for line in lines {
            writeln!(out, "  {:width$}  {}", "", line, width = def.label.len())?;
        }
    }
    Ok(())
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    write!(out, "{} [Y/n]: ", question)?;
    out.flush()?;
    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(out)?;
        return Ok(false);
    }
    let answer = answer.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}

/// Execute the generate command
pub fn generate_command<R: BufRead, W: Write>(
    session: &Session,
    args: GenerateArgs,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    write_notices(session, out)?;
    let mut selection = session.select(args.templates.as_slice())?;
    if args.key_field.is_some() {
        selection.set_key_field(args.key_field);
    }

    if let Some(path) = &args.values {
        match selection.load_values(path) {
            Ok(outcome) => {
                writeln!(
                    out,
                    "Loaded {} value(s) from {}",
                    outcome.applied.len(),
                    path.display()
                )?;
                if !outcome.ignored.is_empty() {
                    writeln!(out, "  Ignored: {}", outcome.ignored.join(", "))?;
                }
            }
            // The form is left as it was; the user can still fill it in
            Err(error) if args.interactive => writeln!(out, "{}", error)?,
            Err(error) => return Err(error.into()),
        }
    }

    for (id, value) in &args.set {
        if !selection.form_mut().set(id, value)? {
            anyhow::bail!("Invalid value for {}: expected DD/MM/YYYY, got \"{}\"", id, value);
        }
    }

    if args.interactive {
        let mut form = TerminalForm::new(&mut *input, &mut *out);
        selection.fill_form(&mut form)?;
    }

    let values = selection.proceed_to_generation()?;

    if let Some(path) = &args.save_values {
        selection
            .save_values(path)
            .with_context(|| format!("Failed to save values to {}", path.display()))?;
        writeln!(out, "Saved values to {}", path.display())?;
    }

    if args.interactive {
        write_review(out, selection.model(), &values)?;
        let question = format!("Generate {} document(s)?", selection.templates().len());
        if !confirm(input, out, &question)? {
            writeln!(out, "Cancelled.")?;
            return Ok(());
        }
    }

    let output_dir = args.output.unwrap_or_else(|| session.output_dir());
    let report = {
        let mut progress = ProgressPrinter { out: &mut *out };
        selection.generate(&values, &output_dir, &mut progress)?
    };

    let generated = report.succeeded().count();
    writeln!(out)?;
    writeln!(
        out,
        "Generated {} of {} document(s) in {}",
        generated,
        report.len(),
        output_dir.display()
    )?;

    if !report.is_success() {
        let failed: Vec<&str> = report.failed().map(|(template, _)| template).collect();
        anyhow::bail!("Generation failed for: {}", failed.join(", "));
    }
    Ok(())
}
