//! Golden replay: fills every `cases/<name>/schema.json` with the scripted
//! `answers.json` and compares the records against `expected.json`.
//! Generated ids are compared by shape only.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use json_form::path_de::read_with_path;
use json_form::{Answer, Scripted};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").expect("uuid pattern is valid")
});

const UUID_PLACEHOLDER: &str = "<uuid>";

fn main() -> Result<()> {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("cases");
    let mut cases = std::fs::read_dir(&root)
        .with_context(|| format!("failed to list {}", root.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    cases.sort();

    let mut failed = 0;
    for case in &cases {
        let name = case.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        match run_case(case) {
            Ok(None) => println!("{} {name}", "PASS".green()),
            Ok(Some((actual, expected))) => {
                failed += 1;
                println!("{} {name}", "FAIL".red());
                println!("  expected: {}", serde_json::to_string(&expected)?);
                println!("  actual:   {}", serde_json::to_string(&actual)?);
            }
            Err(error) => {
                failed += 1;
                println!("{} {name}: {error:#}", "ERROR".red());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} cases failed", cases.len());
    }
    println!("{} cases passed", cases.len());
    Ok(())
}

/// `None` when the records match, otherwise the normalized `(actual, expected)`.
fn run_case(dir: &Path) -> Result<Option<(Value, Value)>> {
    let mut form = json_form::lower::load_form(&dir.join("schema.json"))?;
    let answers: Vec<Answer> = read_with_path(&dir.join("answers.json"))?;
    let expected: Value = read_with_path(&dir.join("expected.json"))?;

    let mut port = Scripted::new(answers);
    let mut records = Vec::new();
    loop {
        let before = port.remaining();
        records.push(form.fill(&mut port)?);
        let left = port.remaining();
        if left == 0 {
            break;
        }
        if left == before {
            bail!("{left} unused answers: the schema asks no questions");
        }
    }

    let actual = normalize(Value::Array(records));
    let expected = normalize(expected);
    Ok((actual != expected).then_some((actual, expected)))
}

fn normalize(value: Value) -> Value {
    match value {
        Value::String(s) if UUID.is_match(&s) => Value::String(UUID_PLACEHOLDER.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect()),
        other => other,
    }
}
