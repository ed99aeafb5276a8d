use thiserror::Error;

/// Rejected schema construction. The offending field is not added.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("field named {name:?} already exists in form {form:?}")]
    DuplicateField { form: String, name: String },
    #[error("field name is not a valid identifier: {0:?}")]
    InvalidName(String),
    #[error("sentinel of repeatable field {0:?} cannot be an empty string")]
    EmptySentinel(String),
    #[error("sentinel {sentinel:?} of repeatable field {field:?} must not be one of its choices")]
    SentinelIsChoice { field: String, sentinel: String },
    #[error("default value {default} of field {field:?} is not one of its choices")]
    DefaultNotAChoice { field: String, default: String },
    #[error("choice field {0:?} needs at least one choice")]
    EmptyChoices(String),
    #[error("polymorphic field {0:?} must use at least 2 different types")]
    TooFewVariants(String),
    #[error("type {tag:?} of polymorphic field {field:?} is listed more than once")]
    DuplicateVariant { field: String, tag: String },
    #[error("polymorphic field {0:?} has a blank type; use a default type instead")]
    EmptyVariantTag(String),
    #[error("default type {tag:?} of polymorphic field {field:?} is not one of its types")]
    UnknownDefaultType { field: String, tag: String },
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("input interrupted")]
    Interrupted,
    #[error("prompt I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("scripted answers ran out at prompt {prompt:?}")]
    ScriptExhausted { prompt: String },
}

/// A raw answer that the field's converter rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ConvertError(pub String);

impl ConvertError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum FillError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    /// `ask` was called with no pending question.
    #[error("no more questions to ask in form {form:?}; reset the form first")]
    Exhausted { form: String },
    #[error("{path} does not accept an explicit null")]
    NullNotAllowed { path: String },
    #[error("hook for {path} failed")]
    Hook {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Failure to turn a schema document into a form.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read schema document: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed schema document {0}")]
    Parse(String),
    #[error("default {value} of field {field:?} is invalid: {source}")]
    InvalidDefault {
        field: String,
        value: String,
        #[source]
        source: ConvertError,
    },
    #[error("option {option:?} does not apply to {kind} field {field:?}")]
    Inapplicable { field: String, kind: String, option: &'static str },
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),
}
