// Declarative schema documents (JSON). Lowered into a `Form` by `crate::lower`.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::form::GroupPrompting;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormDoc {
    #[serde(default)]
    pub name: String,
    pub fields: Vec<FieldDoc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    AutoId,
    Text,
    Bool,
    Integer,
    Float,
    Datetime,
    Choice,
    Object,
    Polymorphic,
}

/// One field. Options that do not apply to `kind` are rejected when lowering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDoc {
    pub name: String,
    pub kind: Kind,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub repeatable: bool,

    // --- scalar options ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentinel: Option<String>,
    #[serde(default)]
    pub remember_last: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<Value>>,
    #[serde(default = "wrap_by_default")]
    pub wrap: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    // --- group options ---
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDoc>,
    /// `{tag: [fields]}` in declaration order. Repeated tags are kept so lowering
    /// can reject them.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "variants_as_map",
        deserialize_with = "variants_from_map"
    )]
    pub variants: Vec<(String, Vec<FieldDoc>)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_type: Option<String>,
    #[serde(default)]
    pub prompting: GroupPrompting,
}

fn wrap_by_default() -> bool {
    true
}

impl Kind {
    pub fn is_group(self) -> bool {
        matches!(self, Kind::Object | Kind::Polymorphic)
    }
}

fn variants_as_map<S: Serializer>(variants: &[(String, Vec<FieldDoc>)], ser: S) -> Result<S::Ok, S::Error> {
    ser.collect_map(variants.iter().map(|(tag, fields)| (tag, fields)))
}

fn variants_from_map<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<(String, Vec<FieldDoc>)>, D::Error> {
    struct Entries;

    impl<'de> Visitor<'de> for Entries {
        type Value = Vec<(String, Vec<FieldDoc>)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from type tag to its fields")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    de.deserialize_map(Entries)
}
