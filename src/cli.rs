//! CLI: fill records from a schema document, interactively or from a script of answers.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::form::Form;
use crate::prompt::{Answer, PromptPort, Scripted, Terminal};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// prompt for JSON records shaped by a declarative schema document
#[derive(Parser, Debug)]
#[command(name = "json-form", version)]
pub struct CommandLineInterface {
    /// more logging on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// fill records interactively on the terminal
    Fill(FillOut),
    /// validate a schema document and print its outline
    Check(SchemaSettings),
    /// fill records from a JSON array of answers (strings, or null for an explicit null)
    Replay(ReplayOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct OutputSettings {
    /// write records as newline-delimited JSON (NDJSON) instead of one array
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct FillOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    output_settings: OutputSettings,

    /// number of records to fill
    #[arg(long, conflicts_with = "repeat")]
    count: Option<usize>,

    /// keep filling records until declined
    #[arg(long)]
    repeat: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ReplayOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    output_settings: OutputSettings,

    /// answers file: JSON array of strings and nulls
    #[arg(long, short)]
    answers: PathBuf,

    /// number of records to fill (default: until the answers run out)
    #[arg(long)]
    count: Option<usize>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> Result<Form> {
        crate::lower::load_form(&self.schema)
            .with_context(|| format!("failed to load schema {}", self.schema.display()))
    }
}

impl OutputSettings {
    fn emit(&self, records: &[Value]) -> Result<()> {
        let src = if self.ndjson {
            let mut lines = String::new();
            for record in records {
                lines.push_str(&serde_json::to_string(record)?);
                lines.push('\n');
            }
            lines
        } else {
            serde_json::to_string_pretty(records)? + "\n"
        };
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                std::fs::write(out, &src).with_context(|| format!("failed to write {}", out.display()))?;
                tracing::info!(records = records.len(), out = %out.display(), "records written");
            }
            None => print!("{src}"),
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        init_logging(self.verbose);
        match &self.cmd {
            Command::Fill(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let mut form = target.schema_settings.load()?;
                let mut port = Terminal::stdio();
                let records = fill_records(&mut form, &mut port, |port, filled| match target.count {
                    Some(count) => Ok(filled < count),
                    None if target.repeat => Ok(port.ask_confirm("Enter another record?")?),
                    None => Ok(false),
                })?;
                target.output_settings.emit(&records)
            }
            Command::Check(target) => {
                let form = target.load()?;
                print!("{form}");
                eprintln!("{}: ok ({} top-level fields)", target.schema.display(), form.len());
                Ok(())
            }
            Command::Replay(target) => {
                let mut form = target.schema_settings.load()?;
                let answers: Vec<Answer> = crate::path_de::read_with_path(&target.answers)
                    .with_context(|| format!("failed to load answers {}", target.answers.display()))?;
                let mut port = Scripted::new(answers);
                let records = match target.count {
                    Some(count) => fill_records(&mut form, &mut port, |_, filled| Ok(filled < count))?,
                    None => {
                        let until_exhausted = until_answers_run_out(port.remaining());
                        fill_records(&mut form, &mut port, until_exhausted)?
                    }
                };
                for error in port.errors() {
                    tracing::info!(%error, "rejected scripted answer");
                }
                target.output_settings.emit(&records)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Fills one record, then more while `another` (given the port and the number
/// filled so far) says so.
fn fill_records<P: PromptPort>(
    form: &mut Form,
    port: &mut P,
    mut another: impl FnMut(&mut P, usize) -> Result<bool>,
) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    loop {
        let record = form
            .fill(port)
            .with_context(|| format!("record {} was abandoned", records.len() + 1))?;
        records.push(record);
        if !another(port, records.len())? {
            return Ok(records);
        }
    }
}

/// Continue while answers are left. A record that took no answers means the
/// schema asks nothing, so leftover answers are an error rather than a loop.
fn until_answers_run_out(initial: usize) -> impl FnMut(&mut Scripted, usize) -> Result<bool> {
    let mut before = initial;
    move |port, _| {
        let left = port.remaining();
        if left == 0 {
            return Ok(false);
        }
        if left == before {
            anyhow::bail!("{left} unused answers: the schema asks no questions");
        }
        before = left;
        Ok(true)
    }
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ScalarOptions;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_fill_arguments() {
        let cli = CommandLineInterface::try_parse_from([
            "json-form", "-vv", "fill", "--schema", "s.json", "--count", "2", "--ndjson",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Fill(fill) = cli.cmd else { panic!("expected fill") };
        assert_eq!(fill.count, Some(2));
        assert!(fill.output_settings.ndjson);
        assert_eq!(fill.schema_settings.schema, PathBuf::from("s.json"));
    }

    #[test]
    fn count_conflicts_with_repeat() {
        let parsed = CommandLineInterface::try_parse_from([
            "json-form", "fill", "--schema", "s.json", "--count", "2", "--repeat",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn fills_until_answers_run_out() {
        let mut form = Form::new("");
        form.add_field("word", ScalarOptions::default()).unwrap();
        let mut port = Scripted::new(["a", "b", "c"]);
        let records = fill_records(&mut form, &mut port, until_answers_run_out(3)).unwrap();
        assert_eq!(records, vec![json!({"word": "a"}), json!({"word": "b"}), json!({"word": "c"})]);
    }

    #[test]
    fn leftover_answers_for_a_silent_schema_fail() {
        let mut form = Form::new("");
        form.add_auto_id_field("id").unwrap();
        let mut port = Scripted::new(["leftover"]);
        let err = fill_records(&mut form, &mut port, until_answers_run_out(1)).unwrap_err();
        assert_eq!(err.to_string(), "1 unused answers: the schema asks no questions");
        assert_eq!(port.remaining(), 1);
    }

    #[test]
    fn empty_script_fills_one_record_for_a_silent_schema() {
        let mut form = Form::new("");
        form.add_auto_id_field("id").unwrap();
        let mut port = Scripted::new(Vec::<&str>::new());
        let records = fill_records(&mut form, &mut port, until_answers_run_out(0)).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn writes_ndjson_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/records.ndjson");
        let settings = OutputSettings { ndjson: true, out: Some(out.clone()) };
        settings.emit(&[json!({"a": 1}), json!({"b": [true]})]).unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "{\"a\":1}\n{\"b\":[true]}\n");
    }
}
