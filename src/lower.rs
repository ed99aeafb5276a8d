use std::path::Path as FsPath;

use serde_json::Value;

use crate::error::{ConvertError, LoadError};
use crate::form::{
    Converter, DefaultProvider, Form, GroupOptions, ScalarOptions, Sequence, TypeSelector,
};
use crate::ir::{FieldDoc, FormDoc, Kind};

/// Reads a JSON schema document and lowers it into a fillable form.
pub fn load_form(path: &FsPath) -> Result<Form, LoadError> {
    let doc: FormDoc = crate::path_de::read_with_path(path)?;
    lower_to_form(&doc)
}

pub fn lower_to_form(doc: &FormDoc) -> Result<Form, LoadError> {
    let mut form = Form::new(doc.name.clone());
    lower_fields(&mut form, &doc.fields)?;
    tracing::debug!(form = %doc.name, fields = form.len(), "lowered schema document");
    Ok(form)
}

fn lower_fields(form: &mut Form, fields: &[FieldDoc]) -> Result<(), LoadError> {
    for field in fields {
        lower_field(form, field)?;
    }
    Ok(())
}

fn lower_field(form: &mut Form, doc: &FieldDoc) -> Result<(), LoadError> {
    check_options(doc)?;
    let name = doc.name.as_str();
    match doc.kind {
        Kind::AutoId => {
            form.add_auto_id_field(name)?;
        }
        Kind::Text => {
            form.add_field(name, scalar_options(doc, Converter::Text)?)?;
        }
        Kind::Bool => {
            form.add_field(name, scalar_options(doc, Converter::Bool)?)?;
        }
        Kind::Integer => {
            form.add_field(name, scalar_options(doc, Converter::Integer)?)?;
        }
        Kind::Float => {
            form.add_field(name, scalar_options(doc, Converter::Float)?)?;
        }
        Kind::Datetime => {
            form.add_field(name, scalar_options(doc, Converter::DateTime)?)?;
        }
        Kind::Choice => {
            let converter = Converter::Choice(doc.choices.clone());
            form.add_field(name, scalar_options(doc, converter)?)?;
        }
        Kind::Object => {
            let nested = form.add_object_field(name, group_options(doc))?;
            lower_fields(nested, &doc.fields)?;
        }
        Kind::Polymorphic => {
            let mut selector = match &doc.type_field {
                Some(field) => TypeSelector::named(field.clone()),
                None => TypeSelector::default(),
            };
            selector.default = doc.default_type.clone();
            let tags = doc.variants.iter().map(|(tag, _)| tag.clone()).collect::<Vec<_>>();
            let variants = form.add_polymorphic_object_field(name, tags, selector, group_options(doc))?;
            for (tag, fields) in &doc.variants {
                if let Some(variant) = variants.variant_mut(tag) {
                    lower_fields(variant, fields)?;
                }
            }
        }
    }
    Ok(())
}

fn scalar_options(doc: &FieldDoc, converter: Converter) -> Result<ScalarOptions, LoadError> {
    let default = match (&doc.default, &doc.sequence) {
        (_, Some(members)) => {
            let members = members
                .iter()
                .map(|member| convert_default(doc, &converter, member))
                .collect::<Result<Vec<_>, _>>()?;
            let seq = Sequence::new(members);
            Some(DefaultProvider::Sequence(if doc.wrap { seq } else { seq.without_wrap() }))
        }
        (Some(value), None) => Some(DefaultProvider::Fixed(convert_default(doc, &converter, value)?)),
        (None, None) => None,
    };
    Ok(ScalarOptions {
        converter,
        default,
        nullable: doc.nullable,
        repeatable: doc.repeatable,
        sentinel: doc.sentinel.clone(),
        remember_last: doc.remember_last,
    })
}

/// Written defaults go through the field's converter, the same as a typed answer
/// (`"yes"` on a bool field is `true`). Other JSON values are kept, except on
/// choice fields, which only hold their listed strings.
fn convert_default(doc: &FieldDoc, converter: &Converter, value: &Value) -> Result<Value, LoadError> {
    let invalid = |source| LoadError::InvalidDefault { field: doc.name.clone(), value: value.to_string(), source };
    match (value, converter) {
        (Value::String(raw), _) => converter.convert(raw).map_err(invalid),
        (_, Converter::Choice(_)) => Err(invalid(ConvertError::new("a choice default must be a string"))),
        _ => Ok(value.clone()),
    }
}

fn group_options(doc: &FieldDoc) -> GroupOptions {
    GroupOptions { nullable: doc.nullable, repeatable: doc.repeatable, prompting: doc.prompting, on_done: None }
}

/// Rejects options set on a field whose kind ignores them.
fn check_options(doc: &FieldDoc) -> Result<(), LoadError> {
    let scalar = !doc.kind.is_group() && doc.kind != Kind::AutoId;
    let present: [(bool, &'static str, bool); 11] = [
        (doc.nullable, "nullable", doc.kind != Kind::AutoId),
        (doc.repeatable, "repeatable", doc.kind != Kind::AutoId),
        (doc.sentinel.is_some(), "sentinel", scalar),
        (doc.remember_last, "remember_last", scalar),
        (doc.default.is_some(), "default", scalar && doc.sequence.is_none()),
        (doc.sequence.is_some(), "sequence", scalar),
        (!doc.wrap, "wrap", doc.sequence.is_some()),
        (!doc.choices.is_empty(), "choices", doc.kind == Kind::Choice),
        (!doc.fields.is_empty(), "fields", doc.kind == Kind::Object),
        (!doc.variants.is_empty(), "variants", doc.kind == Kind::Polymorphic),
        (
            doc.type_field.is_some() || doc.default_type.is_some(),
            "type_field",
            doc.kind == Kind::Polymorphic,
        ),
    ];
    for (set, option, allowed) in present {
        if set && !allowed {
            return Err(LoadError::Inapplicable {
                field: doc.name.clone(),
                kind: format!("{:?}", doc.kind).to_lowercase(),
                option,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::form::FieldKind;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> FormDoc {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn lowers_every_kind() {
        let form = lower_to_form(&doc(json!({
            "name": "event",
            "fields": [
                {"name": "id", "kind": "auto_id"},
                {"name": "title", "kind": "text", "remember_last": true},
                {"name": "count", "kind": "integer", "default": 3},
                {"name": "step", "kind": "text", "sequence": ["one", "two"]},
                {"name": "mood", "kind": "choice", "choices": ["sad", "glad"]},
                {"name": "place", "kind": "object", "nullable": true, "fields": [
                    {"name": "city", "kind": "text"}
                ]},
                {"name": "cite", "kind": "polymorphic", "repeatable": true, "prompting": "ask_every",
                 "variants": {
                    "dialog": [{"name": "line", "kind": "integer"}],
                    "media": [{"name": "timestamp", "kind": "datetime"}]
                 }}
            ]
        })))
        .unwrap();

        assert_eq!(form.name(), "event");
        assert_eq!(form.len(), 7);
        assert!(matches!(form.field("id").unwrap().kind(), FieldKind::AutoId));
        assert_eq!(form.field("count").unwrap().current_default(), Some(json!(3)));
        assert_eq!(form.field("step").unwrap().current_default(), Some(json!("one")));
        assert!(form.field("place").unwrap().is_nullable());

        let FieldKind::Polymorphic(variants) = form.field("cite").unwrap().kind() else {
            panic!("cite should be polymorphic");
        };
        assert_eq!(variants.tags().collect::<Vec<_>>(), vec!["dialog", "media"]);
        let dialog = variants.variant("dialog").unwrap();
        assert_eq!(dialog.fields().iter().map(|f| f.name()).collect::<Vec<_>>(), vec!["type", "line"]);
    }

    #[test]
    fn rejects_inapplicable_options() {
        let err = lower_to_form(&doc(json!({
            "fields": [{"name": "title", "kind": "text", "choices": ["a"]}]
        })))
        .unwrap_err();
        assert!(matches!(err, LoadError::Inapplicable { option: "choices", .. }), "{err}");

        let err = lower_to_form(&doc(json!({
            "fields": [{"name": "id", "kind": "auto_id", "repeatable": true}]
        })))
        .unwrap_err();
        assert!(matches!(err, LoadError::Inapplicable { option: "repeatable", .. }), "{err}");
    }

    #[test]
    fn surfaces_schema_errors() {
        let err = lower_to_form(&doc(json!({
            "fields": [
                {"name": "pet", "kind": "polymorphic", "variants": {"dog": []}}
            ]
        })))
        .unwrap_err();
        assert!(matches!(err, LoadError::Schema(SchemaError::TooFewVariants(_))), "{err}");
    }

    #[test]
    fn repeated_variant_tags_are_rejected() {
        let doc: FormDoc = crate::path_de::from_str_with_path(
            r#"{"fields": [{"name": "pet", "kind": "polymorphic", "variants": {"dog": [], "dog": []}}]}"#,
        )
        .unwrap();
        let err = lower_to_form(&doc).unwrap_err();
        assert!(
            matches!(&err, LoadError::Schema(SchemaError::DuplicateVariant { field, tag }) if field == "pet" && tag == "dog"),
            "{err}"
        );
    }

    #[test]
    fn written_defaults_are_converted() {
        let form = lower_to_form(&doc(json!({
            "fields": [
                {"name": "ok", "kind": "bool", "default": "yes"},
                {"name": "size", "kind": "integer", "default": " 12 "},
                {"name": "at", "kind": "datetime", "default": "2024-03-01T10:00:00Z"},
                {"name": "level", "kind": "choice", "choices": ["low", "high"], "sequence": ["high", "low"]}
            ]
        })))
        .unwrap();
        assert_eq!(form.field("ok").unwrap().current_default(), Some(json!(true)));
        assert_eq!(form.field("size").unwrap().current_default(), Some(json!(12)));
        assert_eq!(form.field("at").unwrap().current_default(), Some(json!("2024-03-01T10:00:00+00:00")));
        assert_eq!(form.field("level").unwrap().current_default(), Some(json!("high")));
    }

    #[test]
    fn rejects_defaults_the_field_would_refuse() {
        let err = lower_to_form(&doc(json!({
            "fields": [{"name": "size", "kind": "integer", "default": "x"}]
        })))
        .unwrap_err();
        assert!(matches!(&err, LoadError::InvalidDefault { field, .. } if field == "size"), "{err}");

        let err = lower_to_form(&doc(json!({
            "fields": [{"name": "level", "kind": "choice", "choices": ["low", "high"], "sequence": ["low", "mid"]}]
        })))
        .unwrap_err();
        assert!(matches!(&err, LoadError::InvalidDefault { value, .. } if value == "\"mid\""), "{err}");

        let err = lower_to_form(&doc(json!({
            "fields": [{"name": "level", "kind": "choice", "choices": ["low"], "default": 1}]
        })))
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidDefault { .. }), "{err}");
    }
}
