//! Schema-driven prompting engine.
//!
//! A [`Form`] is an ordered list of fields, some of which own nested forms.
//! Each form carries a [`Cursor`]; [`Form::ask`] performs exactly one step
//! (one accepted answer, one generated id, or one closed list), descending into
//! nested forms through their own cursors so traversal can stop and resume
//! between any two steps. [`Form::fill`] drives `ask` to completion, folds the
//! steps into a record and rewinds every cursor so the form can be filled again.
pub mod convert;
pub mod cursor;
pub mod default;
pub mod field;
pub mod variants;

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{FillError, SchemaError};
use crate::path::Path;
use crate::prompt::{Answer, PromptPort};
use crate::record::RecordBuilder;

pub use convert::Converter;
pub use cursor::Cursor;
pub use default::{DefaultProvider, Sequence, SharedValue};
pub use field::{
    DEFAULT_SENTINEL, DoneHook, EntryHook, Field, FieldKind, GroupOptions, GroupPrompting, Scalar,
    ScalarOptions, TypeSelector,
};
pub use variants::Variants;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-A-Za-z_$][-A-Za-z0-9_$]*$").expect("identifier pattern is valid")
});

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Default)]
pub struct Form {
    name: String,
    fields: Vec<Field>,
    pub(crate) cursor: Cursor,
}

/// One traversal step: where the value goes and what it is.
///
/// A path ending in the `[none]` marker closes a repeated field and carries null.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub path: Path,
    pub value: Value,
}

/// A nested form as seen from the field that owns it.
pub(crate) trait SubForm {
    fn is_started(&self) -> bool;
    fn has_more(&self) -> bool;
    fn is_empty(&self) -> bool;
    fn ask(&mut self, port: &mut dyn PromptPort, prefix: &Path) -> Result<Step, FillError>;
    fn reset(&mut self);
}

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA CONSTRUCTION
// ————————————————————————————————————————————————————————————————————————————

impl Form {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn check_name(&self, name: &str) -> Result<(), SchemaError> {
        if self.field(name).is_some() {
            return Err(SchemaError::DuplicateField { form: self.name.clone(), name: name.to_string() });
        }
        if !is_identifier(name) {
            return Err(SchemaError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn push(&mut self, field: Field) -> &mut Field {
        self.fields.push(field);
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }

    fn child_name(&self, name: &str) -> String {
        if self.name.is_empty() { name.to_string() } else { format!("{}.{name}", self.name) }
    }

    /// Adds a field filled with a generated UUID v4 string.
    pub fn add_auto_id_field(&mut self, name: &str) -> Result<&mut Field, SchemaError> {
        self.check_name(name)?;
        Ok(self.push(Field::new(name, FieldKind::AutoId)))
    }

    /// Adds a prompted scalar field. Fields are asked in the order they are added.
    pub fn add_field(&mut self, name: &str, options: ScalarOptions) -> Result<&mut Field, SchemaError> {
        self.check_name(name)?;
        let ScalarOptions { converter, default, nullable, repeatable, sentinel, remember_last } = options;
        let sentinel = sentinel.unwrap_or_else(|| DEFAULT_SENTINEL.to_string());
        if repeatable && sentinel.is_empty() {
            return Err(SchemaError::EmptySentinel(name.to_string()));
        }
        if let Some(choices) = converter.choices() {
            check_choices(name, choices, &default, repeatable.then_some(sentinel.as_str()))?;
        }
        let default = match default {
            None if remember_last => Some(DefaultProvider::LastAnswer(None)),
            other => other,
        };
        let scalar = Scalar { converter, default, remember_last, sentinel };
        let field = self.push(Field::new(name, FieldKind::Scalar(scalar)));
        field.nullable = nullable;
        field.repeatable = repeatable;
        Ok(field)
    }

    /// Adds a text field accepting only the listed values.
    pub fn add_choice_field<I, S>(
        &mut self,
        name: &str,
        choices: I,
        options: ScalarOptions,
    ) -> Result<&mut Field, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices = choices.into_iter().map(Into::into).collect();
        self.add_field(name, ScalarOptions { converter: Converter::Choice(choices), ..options })
    }

    /// Adds a field whose value is a nested object; returns the nested form to populate.
    pub fn add_object_field(&mut self, name: &str, options: GroupOptions) -> Result<&mut Form, SchemaError> {
        self.check_name(name)?;
        let nested = Form::new(self.child_name(name));
        let field = self.push(group_field(name, FieldKind::Object(Box::new(nested)), options));
        match &mut field.kind {
            FieldKind::Object(form) => Ok(form.as_mut()),
            _ => unreachable!("object field was just pushed"),
        }
    }

    /// Adds an object field whose shape is chosen by its leading type question.
    ///
    /// Every returned candidate already holds the type-selector field, so fields
    /// named like the selector cannot be added to them.
    pub fn add_polymorphic_object_field<I, S>(
        &mut self,
        name: &str,
        tags: I,
        selector: TypeSelector,
        options: GroupOptions,
    ) -> Result<&mut Variants, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_name(name)?;
        if !is_identifier(&selector.field) {
            return Err(SchemaError::InvalidName(selector.field));
        }
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        if tags.len() < 2 {
            return Err(SchemaError::TooFewVariants(name.to_string()));
        }
        if let Some(default) = &selector.default {
            if !tags.contains(default) {
                return Err(SchemaError::UnknownDefaultType { field: name.to_string(), tag: default.clone() });
            }
        }

        let mut forms = IndexMap::with_capacity(tags.len());
        for tag in &tags {
            if tag.is_empty() {
                return Err(SchemaError::EmptyVariantTag(name.to_string()));
            }
            let mut form = Form::new(self.child_name(name));
            let mut selector_options = ScalarOptions::new(Converter::Choice(tags.clone()));
            selector_options.default = selector.default.clone().map(|tag| DefaultProvider::Fixed(Value::String(tag)));
            form.add_field(&selector.field, selector_options)?;
            if forms.insert(tag.clone(), form).is_some() {
                return Err(SchemaError::DuplicateVariant { field: name.to_string(), tag: tag.clone() });
            }
        }

        let variants = Variants::new(selector.field, forms);
        let field = self.push(group_field(name, FieldKind::Polymorphic(variants), options));
        match &mut field.kind {
            FieldKind::Polymorphic(variants) => Ok(variants),
            _ => unreachable!("polymorphic field was just pushed"),
        }
    }
}

fn group_field(name: &str, kind: FieldKind, options: GroupOptions) -> Field {
    let GroupOptions { nullable, repeatable, prompting, on_done } = options;
    let mut field = Field::new(name, kind);
    field.nullable = nullable;
    field.repeatable = repeatable;
    field.prompting = prompting;
    field.on_done = on_done;
    field
}

fn check_choices(
    name: &str,
    choices: &[String],
    default: &Option<DefaultProvider>,
    sentinel: Option<&str>,
) -> Result<(), SchemaError> {
    if choices.is_empty() {
        return Err(SchemaError::EmptyChoices(name.to_string()));
    }
    if let Some(sentinel) = sentinel {
        if choices.iter().any(|c| c == sentinel) {
            return Err(SchemaError::SentinelIsChoice { field: name.to_string(), sentinel: sentinel.to_string() });
        }
    }
    if let Some(DefaultProvider::Fixed(value)) = default {
        let listed = value.as_str().is_some_and(|v| choices.iter().any(|c| c == v));
        if !listed {
            return Err(SchemaError::DefaultNotAChoice { field: name.to_string(), default: value.to_string() });
        }
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// TRAVERSAL
// ————————————————————————————————————————————————————————————————————————————

impl Form {
    /// Whether another call to [`Form::ask`] has a question to ask.
    pub fn has_more(&self) -> bool {
        let Some(last) = self.fields.len().checked_sub(1) else {
            return false;
        };
        match self.cursor.position {
            None => true,
            Some(index) if index < last => true,
            Some(index) => self.is_pending(index),
        }
    }

    /// The field at `index` still has questions: a repetition is open or its
    /// nested form is part-way through.
    fn is_pending(&self, index: usize) -> bool {
        if self.cursor.repetition.is_some() {
            return true;
        }
        self.fields
            .get(index)
            .and_then(Field::sub_form)
            .is_some_and(|sub| sub.is_started() && sub.has_more())
    }

    /// Asks for the next value and advances the cursor by one step.
    ///
    /// Calling this when [`Form::has_more`] is false is an error.
    pub fn ask(&mut self, port: &mut dyn PromptPort, prefix: &Path) -> Result<Step, FillError> {
        let index = match self.cursor.position {
            Some(index) if self.is_pending(index) => index,
            Some(index) => index + 1,
            None => 0,
        };
        if index >= self.fields.len() {
            return Err(FillError::Exhausted { form: self.name.clone() });
        }
        if self.cursor.position != Some(index) {
            trace!(form = %self.name, index, "cursor advanced");
        }
        self.cursor.position = Some(index);

        let Form { fields, cursor, .. } = self;
        let Field { name, kind, nullable, repeatable, prompting, on_entry, on_done } = &mut fields[index];
        let visit = Visit { port, path: prefix.child(name), cursor, nullable: *nullable, repeatable: *repeatable };
        match kind {
            FieldKind::AutoId => visit.auto_id(on_entry),
            FieldKind::Scalar(scalar) => visit.scalar(scalar, on_entry),
            FieldKind::Object(form) => visit.group(form.as_mut(), *prompting, on_done),
            FieldKind::Polymorphic(variants) => visit.group(variants, *prompting, on_done),
        }
    }

    /// Fills every field and returns the assembled record.
    ///
    /// The cursor tree is rewound afterwards, also when a prompt or hook fails;
    /// a failed fill yields no record.
    pub fn fill(&mut self, port: &mut dyn PromptPort) -> Result<Value, FillError> {
        let mut record = RecordBuilder::new();
        let outcome = self.fill_into(port, &mut record);
        self.reset();
        outcome.map(|()| record.build())
    }

    fn fill_into(&mut self, port: &mut dyn PromptPort, record: &mut RecordBuilder) -> Result<(), FillError> {
        while self.has_more() {
            let step = self.ask(port, &Path::root())?;
            if step.is_end() {
                continue;
            }
            record.fold(&step.path, step.value);
        }
        Ok(())
    }

    /// Rewinds this form and every nested form to before the first question.
    pub fn reset(&mut self) {
        self.cursor.reset();
        for field in &mut self.fields {
            if let Some(sub) = field.sub_form_mut() {
                sub.reset();
            }
        }
    }
}

impl SubForm for Form {
    fn is_started(&self) -> bool {
        self.cursor.is_started()
    }

    fn has_more(&self) -> bool {
        Form::has_more(self)
    }

    fn is_empty(&self) -> bool {
        Form::is_empty(self)
    }

    fn ask(&mut self, port: &mut dyn PromptPort, prefix: &Path) -> Result<Step, FillError> {
        Form::ask(self, port, prefix)
    }

    fn reset(&mut self) {
        Form::reset(self)
    }
}

impl Field {
    fn sub_form(&self) -> Option<&dyn SubForm> {
        match &self.kind {
            FieldKind::Object(form) => Some(form.as_ref()),
            FieldKind::Polymorphic(variants) => Some(variants),
            _ => None,
        }
    }

    fn sub_form_mut(&mut self) -> Option<&mut dyn SubForm> {
        match &mut self.kind {
            FieldKind::Object(form) => Some(form.as_mut()),
            FieldKind::Polymorphic(variants) => Some(variants),
            _ => None,
        }
    }
}

impl Step {
    pub fn new(path: Path, value: Value) -> Self {
        Self { path, value }
    }

    fn end(path: &Path) -> Self {
        Self { path: path.end(), value: Value::Null }
    }

    pub fn is_end(&self) -> bool {
        self.path.is_end()
    }
}

/// The field being asked about in one `ask` call.
struct Visit<'a> {
    port: &'a mut dyn PromptPort,
    path: Path,
    cursor: &'a mut Cursor,
    nullable: bool,
    repeatable: bool,
}

impl Visit<'_> {
    fn auto_id(mut self, on_entry: &mut Option<EntryHook>) -> Result<Step, FillError> {
        let value = Value::String(uuid::Uuid::new_v4().to_string());
        self.port.notice(&format!("Auto-generated {}: {}", self.path, value.as_str().unwrap_or_default()));
        debug!(path = %self.path, %value, "generated id");
        run_entry_hook(on_entry, &self.path, &value)?;
        Ok(Step::new(self.path, value))
    }

    fn scalar(mut self, scalar: &mut Scalar, on_entry: &mut Option<EntryHook>) -> Result<Step, FillError> {
        let entry_path = if self.repeatable {
            self.path.index(self.cursor.enter_repetition())
        } else {
            self.path.clone()
        };
        let default = scalar.default.as_ref().and_then(DefaultProvider::current);
        let sentinel = self.repeatable.then_some(scalar.sentinel.as_str());
        let question = question(&entry_path, default.as_ref(), self.nullable, sentinel);

        let value = loop {
            let raw = match self.port.ask_text(&question)? {
                Answer::Null if self.nullable => break Value::Null,
                Answer::Null => return Err(FillError::NullNotAllowed { path: entry_path.to_string() }),
                Answer::Text(raw) => raw,
            };
            if raw.is_empty() && (self.nullable || default.is_some()) {
                match (&default, scalar.default.as_mut()) {
                    (Some(value), Some(provider)) => {
                        provider.consume();
                        break value.clone();
                    }
                    _ => break Value::Null,
                }
            }
            if self.repeatable && raw == scalar.sentinel {
                self.cursor.close_repetition();
                debug!(path = %self.path, "list closed by sentinel");
                return Ok(Step::end(&self.path));
            }
            match scalar.converter.convert(&raw) {
                Ok(value) => break value,
                Err(error) => {
                    debug!(path = %entry_path, %error, "answer rejected");
                    self.port.error(&format!("Error: {error}"));
                }
            }
        };

        if self.repeatable {
            self.cursor.accept_entry();
        }
        run_entry_hook(on_entry, &entry_path, &value)?;
        if scalar.remember_last {
            scalar.remember(&value);
        }
        debug!(path = %entry_path, %value, "accepted");
        Ok(Step::new(entry_path, value))
    }

    fn group(
        mut self,
        sub: &mut dyn SubForm,
        prompting: GroupPrompting,
        on_done: &mut Option<DoneHook>,
    ) -> Result<Step, FillError> {
        if !self.repeatable {
            if !sub.is_started() {
                if self.nullable && !self.confirm(&format!("{} is nullable. Enter a value for it?", self.path))? {
                    debug!(path = %self.path, "optional group skipped");
                    return Ok(Step::new(self.path, Value::Null));
                }
                if sub.is_empty() {
                    run_done_hook(on_done, &self.path)?;
                    return Ok(Step::new(self.path, Value::Object(Map::new())));
                }
            }
            let step = sub.ask(self.port, &self.path)?;
            if !step.is_end() {
                self.cursor.mark_filled();
            }
            if !sub.has_more() {
                let filled = self.cursor.take_filled();
                debug!(path = %self.path, "group completed");
                run_done_hook(on_done, &self.path)?;
                if !filled {
                    // only closed lists inside: keep the object itself in the record
                    return Ok(Step::new(self.path, Value::Object(Map::new())));
                }
            }
            return Ok(step);
        }

        let n = self.cursor.enter_repetition();
        let entry_path = self.path.index(n);
        if !sub.is_started() {
            let proceed = match prompting {
                GroupPrompting::Gated if n == 0 => {
                    !self.nullable || self.confirm(&format!("{} is optional. Enter a value for it?", self.path))?
                }
                GroupPrompting::Gated => self.confirm(&format!("{} is a list of values. Add another?", self.path))?,
                GroupPrompting::AskEvery => {
                    self.confirm(&format!("{} is a list of values. Enter another one?", self.path))?
                }
            };
            if !proceed {
                self.cursor.close_repetition();
                debug!(path = %self.path, entries = n, "list closed");
                return Ok(Step::end(&self.path));
            }
            if prompting == GroupPrompting::AskEvery
                && self.nullable
                && !self.confirm(&format!("{entry_path} is nullable. Enter a value for it?"))?
            {
                self.cursor.accept_entry();
                return Ok(Step::new(entry_path, Value::Null));
            }
            if sub.is_empty() {
                self.cursor.accept_entry();
                run_done_hook(on_done, &entry_path)?;
                return Ok(Step::new(entry_path, Value::Object(Map::new())));
            }
        }

        let step = sub.ask(self.port, &entry_path)?;
        if !step.is_end() {
            self.cursor.mark_filled();
        }
        if !sub.has_more() {
            let filled = self.cursor.take_filled();
            sub.reset();
            self.cursor.accept_entry();
            debug!(path = %entry_path, "group entry completed");
            run_done_hook(on_done, &entry_path)?;
            if !filled {
                return Ok(Step::new(entry_path, Value::Object(Map::new())));
            }
        }
        Ok(step)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, FillError> {
        Ok(self.port.ask_confirm(prompt)?)
    }
}

/// Question text for a scalar field: path, default, null and sentinel notes, `": "`.
pub fn question(path: &Path, default: Option<&Value>, nullable: bool, sentinel: Option<&str>) -> String {
    let mut prompt = path.to_string();
    if let Some(default) = default {
        prompt.push_str(&format!(" (default: {default})"));
    }
    if nullable {
        prompt.push_str("\n(Ctrl-D for explicit null)");
    }
    if let Some(sentinel) = sentinel {
        prompt.push_str(&format!("\n(type {sentinel:?} to end adding values)"));
    }
    prompt.push_str(": ");
    prompt
}

fn run_entry_hook(hook: &mut Option<EntryHook>, path: &Path, value: &Value) -> Result<(), FillError> {
    match hook {
        Some(hook) => hook(value).map_err(|source| FillError::Hook { path: path.to_string(), source }),
        None => Ok(()),
    }
}

fn run_done_hook(hook: &mut Option<DoneHook>, path: &Path) -> Result<(), FillError> {
    match hook {
        Some(hook) => hook().map_err(|source| FillError::Hook { path: path.to_string(), source }),
        None => Ok(()),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// OUTLINE
// ————————————————————————————————————————————————————————————————————————————

impl fmt::Display for Form {
    /// Indented outline of the fields, one per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_outline(f, self, 0)
    }
}

fn write_outline(f: &mut fmt::Formatter<'_>, form: &Form, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    for field in &form.fields {
        let mut label = field.name.clone();
        if field.repeatable {
            label.push_str("[]");
        }
        if field.nullable {
            label.push('?');
        }
        match &field.kind {
            FieldKind::AutoId => writeln!(f, "{indent}{label}: auto id")?,
            FieldKind::Scalar(scalar) => {
                write!(f, "{indent}{label}: {}", converter_label(&scalar.converter))?;
                if field.repeatable {
                    write!(f, " (until {:?})", scalar.sentinel)?;
                }
                if let Some(default) = scalar.default.as_ref().and_then(DefaultProvider::current) {
                    write!(f, " (default: {default})")?;
                }
                writeln!(f)?;
            }
            FieldKind::Object(nested) => {
                writeln!(f, "{indent}{label}: object")?;
                write_outline(f, nested, depth + 1)?;
            }
            FieldKind::Polymorphic(variants) => {
                let tags = variants.tags().collect::<Vec<_>>().join(" | ");
                writeln!(f, "{indent}{label}: one of {tags} (by {:?})", variants.type_field())?;
                for (tag, nested) in variants.iter() {
                    writeln!(f, "{indent}  {tag}:")?;
                    write_outline(f, nested, depth + 2)?;
                }
            }
        }
    }
    Ok(())
}

fn converter_label(converter: &Converter) -> String {
    match converter {
        Converter::Text => "text".to_string(),
        Converter::Bool => "bool".to_string(),
        Converter::Integer => "integer".to_string(),
        Converter::Float => "float".to_string(),
        Converter::DateTime => "datetime".to_string(),
        Converter::Choice(choices) => format!("choice of {}", choices.join(" | ")),
        Converter::Custom(_) => "custom".to_string(),
    }
}
