//! Prompt a user field by field and assemble JSON records from the answers.
pub mod cli;
pub mod error;
pub mod form;
pub mod ir;
pub mod lower;
pub mod path;
pub mod path_de;
pub mod prompt;
pub mod record;

pub use error::{ConvertError, FillError, LoadError, PromptError, SchemaError};
pub use form::{
    Converter, DefaultProvider, Field, FieldKind, Form, GroupOptions, GroupPrompting, ScalarOptions, Sequence,
    SharedValue, Step, TypeSelector, Variants,
};
pub use path::Path;
pub use prompt::{Answer, PromptPort, Scripted, Terminal};
