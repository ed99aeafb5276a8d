//! Field declarations and the options used to add them to a [`Form`].
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Form;
use super::convert::Converter;
use super::default::DefaultProvider;
use super::variants::Variants;

pub const DEFAULT_SENTINEL: &str = "done";

/// Called with every accepted value of a field.
pub type EntryHook = Box<dyn FnMut(&Value) -> anyhow::Result<()>>;
/// Called each time an object field finishes one sub-record.
pub type DoneHook = Box<dyn FnMut() -> anyhow::Result<()>>;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

pub struct Field {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) nullable: bool,
    pub(crate) repeatable: bool,
    pub(crate) prompting: GroupPrompting,
    pub(crate) on_entry: Option<EntryHook>,
    pub(crate) on_done: Option<DoneHook>,
}

#[derive(Debug)]
pub enum FieldKind {
    /// Filled with a generated UUID; never prompts.
    AutoId,
    Scalar(Scalar),
    Object(Box<Form>),
    /// Shape chosen by the answer to a leading type question.
    Polymorphic(Variants),
}

#[derive(Debug, Clone)]
pub struct Scalar {
    pub(crate) converter: Converter,
    pub(crate) default: Option<DefaultProvider>,
    pub(crate) remember_last: bool,
    pub(crate) sentinel: String,
}

/// How repeated (and optional) object fields ask whether to continue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPrompting {
    /// `nullable` gates the first entry only; "add another?" gates each later entry.
    #[default]
    Gated,
    /// "Enter another one?" before every entry, first included. When the field is
    /// also `nullable`, each entry may be recorded as null.
    AskEvery,
}

/// Options for [`Form::add_field`].
#[derive(Debug, Clone, Default)]
pub struct ScalarOptions {
    pub converter: Converter,
    pub default: Option<DefaultProvider>,
    pub nullable: bool,
    pub repeatable: bool,
    /// Terminates a repeatable field; `"done"` when unset.
    pub sentinel: Option<String>,
    pub remember_last: bool,
}

/// Options for object and polymorphic fields.
#[derive(Default)]
pub struct GroupOptions {
    pub nullable: bool,
    pub repeatable: bool,
    pub prompting: GroupPrompting,
    pub on_done: Option<DoneHook>,
}

/// The leading question of a polymorphic field.
#[derive(Debug, Clone)]
pub struct TypeSelector {
    pub field: String,
    pub default: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Field {
    pub(crate) fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            nullable: false,
            repeatable: false,
            prompting: GroupPrompting::default(),
            on_entry: None,
            on_done: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    /// Registers a hook receiving each accepted value (scalar and auto-id fields).
    pub fn on_entry(&mut self, hook: impl FnMut(&Value) -> anyhow::Result<()> + 'static) -> &mut Self {
        self.on_entry = Some(Box::new(hook));
        self
    }

    /// The current default of a scalar field, if any.
    pub fn current_default(&self) -> Option<Value> {
        match &self.kind {
            FieldKind::Scalar(scalar) => scalar.default.as_ref().and_then(DefaultProvider::current),
            _ => None,
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("repeatable", &self.repeatable)
            .field("prompting", &self.prompting)
            .field("on_entry", &self.on_entry.is_some())
            .field("on_done", &self.on_done.is_some())
            .finish()
    }
}

impl Scalar {
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn remembers_last(&self) -> bool {
        self.remember_last
    }

    /// Replaces the default with the accepted answer. A null answer clears it.
    pub(crate) fn remember(&mut self, value: &Value) {
        let last = (!value.is_null()).then(|| value.clone());
        self.default = Some(DefaultProvider::LastAnswer(last));
    }
}

impl ScalarOptions {
    pub fn new(converter: Converter) -> Self {
        Self { converter, ..Self::default() }
    }

    pub fn default_value(mut self, default: impl Into<DefaultProvider>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = Some(sentinel.into());
        self
    }

    pub fn remember_last(mut self) -> Self {
        self.remember_last = true;
        self
    }
}

impl GroupOptions {
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn prompting(mut self, prompting: GroupPrompting) -> Self {
        self.prompting = prompting;
        self
    }

    pub fn on_done(mut self, hook: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.on_done = Some(Box::new(hook));
        self
    }
}

impl Default for TypeSelector {
    fn default() -> Self {
        Self { field: "type".to_string(), default: None }
    }
}

impl TypeSelector {
    pub fn named(field: impl Into<String>) -> Self {
        Self { field: field.into(), default: None }
    }

    pub fn with_default(mut self, tag: impl Into<String>) -> Self {
        self.default = Some(tag.into());
        self
    }
}
