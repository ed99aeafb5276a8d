//! Candidate forms of a polymorphic field.
//!
//! Every candidate starts with the same type-selector field. Until that
//! question is answered no candidate is active; the first candidate asks it,
//! then the candidate matching the answer becomes active with its own first
//! field marked as answered. The selection only changes through that question
//! and is cleared by `reset`.
use indexmap::IndexMap;

use super::{Form, SubForm};
use crate::error::FillError;
use crate::form::Step;
use crate::path::Path;
use crate::prompt::PromptPort;

#[derive(Debug)]
pub struct Variants {
    type_field: String,
    forms: IndexMap<String, Form>,
    active: Option<usize>,
}

impl Variants {
    pub(crate) fn new(type_field: String, forms: IndexMap<String, Form>) -> Self {
        Self { type_field, forms, active: None }
    }

    pub fn type_field(&self) -> &str {
        &self.type_field
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    pub fn variant(&self, tag: &str) -> Option<&Form> {
        self.forms.get(tag)
    }

    pub fn variant_mut(&mut self, tag: &str) -> Option<&mut Form> {
        self.forms.get_mut(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Form)> {
        self.forms.iter().map(|(tag, form)| (tag.as_str(), form))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Form)> {
        self.forms.iter_mut().map(|(tag, form)| (tag.as_str(), form))
    }

    /// Tag of the candidate selected for the sub-record in progress.
    pub fn active_tag(&self) -> Option<&str> {
        let index = self.active?;
        self.forms.get_index(index).map(|(tag, _)| tag.as_str())
    }
}

impl SubForm for Variants {
    fn is_started(&self) -> bool {
        self.active.is_some()
    }

    fn has_more(&self) -> bool {
        match self.active {
            None => true,
            Some(index) => self.forms.get_index(index).is_some_and(|(_, form)| form.has_more()),
        }
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn ask(&mut self, port: &mut dyn PromptPort, prefix: &Path) -> Result<Step, FillError> {
        if let Some(index) = self.active {
            let Some((_, form)) = self.forms.get_index_mut(index) else {
                return Err(FillError::Exhausted { form: prefix.to_string() });
            };
            return form.ask(port, prefix);
        }

        let step = match self.forms.get_index_mut(0) {
            Some((_, first)) => first.ask(port, prefix)?,
            None => return Err(FillError::Exhausted { form: prefix.to_string() }),
        };

        // the selector only accepts declared tags
        let index = step
            .value
            .as_str()
            .and_then(|tag| self.forms.get_index_of(tag))
            .unwrap_or(0);
        if index != 0 {
            if let Some((_, first)) = self.forms.get_index_mut(0) {
                first.reset();
            }
            if let Some((_, selected)) = self.forms.get_index_mut(index) {
                selected.cursor.skip_first();
            }
        }
        tracing::debug!(path = %prefix, tag = ?step.value, "selected variant");
        self.active = Some(index);
        Ok(step)
    }

    fn reset(&mut self) {
        self.active = None;
        for form in self.forms.values_mut() {
            form.reset();
        }
    }
}
