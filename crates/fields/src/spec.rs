use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// How a field is normalized and compared.
///
/// Closed set: adding a comparison strategy means adding a variant, and the
/// compiler rejects unknown type tags up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldType {
    /// Free string compared by edit-style similarity.
    #[default]
    String,
    /// Short codes and names; same comparison as `String`, blocked more eagerly.
    ShortString,
    /// Long free text compared token-wise.
    Text,
    /// Equal or not equal; nothing in between.
    Exact,
    /// Numeric amount. Normalized to a float.
    Price,
    /// `(lat, long)` pair. Normalized to two floats.
    LatLong,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::ShortString => "ShortString",
            FieldType::Text => "Text",
            FieldType::Exact => "Exact",
            FieldType::Price => "Price",
            FieldType::LatLong => "LatLong",
        }
    }

    /// Whether the normalized value stays a string.
    pub fn is_textual(&self) -> bool {
        !matches!(self, FieldType::Price | FieldType::LatLong)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "String" => Ok(FieldType::String),
            "ShortString" => Ok(FieldType::ShortString),
            "Text" => Ok(FieldType::Text),
            "Exact" => Ok(FieldType::Exact),
            "Price" => Ok(FieldType::Price),
            "LatLong" => Ok(FieldType::LatLong),
            other => Err(other.to_string()),
        }
    }
}

/// Optional comparison behaviour attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// Missing values are expected; the matcher tracks missingness instead of
    /// treating it as disagreement.
    HasMissing,
    /// Use a learned (CRF-style) string comparator.
    Crf,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::HasMissing => "has missing",
            Modifier::Crf => "crf",
        }
    }
}

impl FromStr for Modifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "has missing" | "has-missing" => Ok(Modifier::HasMissing),
            "crf" => Ok(Modifier::Crf),
            other => Err(other.to_string()),
        }
    }
}

/// Compiled field definition handed to the matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    pub fn has_missing(&self) -> bool {
        self.modifiers.contains(&Modifier::HasMissing)
    }

    pub fn crf(&self) -> bool {
        self.modifiers.contains(&Modifier::Crf)
    }
}

/// Caller-facing field entry, before validation.
///
/// Deserializes from either a string or a list of strings, so YAML such as
///
/// ```yaml
/// fields:
///   - name
///   - [price, Price]
///   - [phone, String, has missing]
/// ```
///
/// maps directly onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFieldSpec {
    Name(String),
    Parts(Vec<String>),
}

impl RawFieldSpec {
    /// The field name, if the entry has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            RawFieldSpec::Name(n) => Some(n.as_str()),
            RawFieldSpec::Parts(parts) => parts.first().map(String::as_str),
        }
    }

    /// True for a bare field name (a one-part list counts as bare).
    pub fn is_bare(&self) -> bool {
        match self {
            RawFieldSpec::Name(_) => true,
            RawFieldSpec::Parts(parts) => parts.len() == 1,
        }
    }
}

impl From<&str> for RawFieldSpec {
    fn from(name: &str) -> Self {
        RawFieldSpec::Name(name.to_string())
    }
}

impl From<String> for RawFieldSpec {
    fn from(name: String) -> Self {
        RawFieldSpec::Name(name)
    }
}

impl From<(&str, &str)> for RawFieldSpec {
    fn from((name, ty): (&str, &str)) -> Self {
        RawFieldSpec::Parts(vec![name.to_string(), ty.to_string()])
    }
}

impl From<(&str, &str, &str)> for RawFieldSpec {
    fn from((name, ty, modifier): (&str, &str, &str)) -> Self {
        RawFieldSpec::Parts(vec![name.to_string(), ty.to_string(), modifier.to_string()])
    }
}

/// Compile caller field entries into engine field definitions.
///
/// - bare name → `String` field
/// - `(name, type)` → explicit type
/// - `(name, type, modifier)` → type plus exactly one modifier
///
/// Unknown types and modifiers are configuration errors naming the token.
pub fn compile(raw: &[RawFieldSpec]) -> Result<Vec<FieldSpec>, FieldError> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());

    for entry in raw {
        let spec = compile_one(entry)?;
        if !seen.insert(spec.name.clone()) {
            return Err(FieldError::DuplicateField(spec.name));
        }
        out.push(spec);
    }

    Ok(out)
}

fn compile_one(entry: &RawFieldSpec) -> Result<FieldSpec, FieldError> {
    let parts: Vec<&str> = match entry {
        RawFieldSpec::Name(n) => vec![n.as_str()],
        RawFieldSpec::Parts(p) => p.iter().map(String::as_str).collect(),
    };

    let (name, ty, modifier) = match parts.as_slice() {
        [name] => (*name, None, None),
        [name, ty] => (*name, Some(*ty), None),
        [name, ty, modifier] => (*name, Some(*ty), Some(*modifier)),
        _ => {
            return Err(FieldError::InvalidArity {
                entry: parts.iter().map(|s| s.to_string()).collect(),
            })
        }
    };

    if name.trim().is_empty() {
        return Err(FieldError::EmptyName);
    }

    let field_type = match ty {
        Some(t) => t.parse::<FieldType>().map_err(|token| FieldError::UnknownType {
            field: name.to_string(),
            token,
        })?,
        None => FieldType::String,
    };

    let mut spec = FieldSpec::new(name, field_type);
    if let Some(m) = modifier {
        let modifier = m.parse::<Modifier>().map_err(|token| FieldError::InvalidModifier {
            field: name.to_string(),
            token,
        })?;
        spec = spec.with_modifier(modifier);
    }

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_mixed_entries_in_order() {
        let raw: Vec<RawFieldSpec> = vec![
            "a".into(),
            ("b", "Price").into(),
            ("c", "String", "has missing").into(),
        ];
        let specs = compile(&raw).expect("valid specs");

        let types: Vec<FieldType> = specs.iter().map(|s| s.field_type).collect();
        assert_eq!(types, vec![FieldType::String, FieldType::Price, FieldType::String]);
        assert_eq!(
            specs.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert!(!specs[0].has_missing());
        assert!(!specs[1].has_missing());
        assert!(specs[2].has_missing());
    }

    #[test]
    fn unknown_modifier_names_token() {
        let raw: Vec<RawFieldSpec> = vec![("c", "String", "sometimes missing").into()];
        let err = compile(&raw).expect_err("bad modifier");
        assert_eq!(
            err,
            FieldError::InvalidModifier {
                field: "c".into(),
                token: "sometimes missing".into()
            }
        );
        assert!(err.to_string().contains("sometimes missing"));
    }

    #[test]
    fn unknown_type_rejected() {
        let raw: Vec<RawFieldSpec> = vec![("c", "Currency").into()];
        assert!(matches!(
            compile(&raw),
            Err(FieldError::UnknownType { token, .. }) if token == "Currency"
        ));
    }

    #[test]
    fn crf_modifier() {
        let raw: Vec<RawFieldSpec> = vec![("addr", "String", "crf").into()];
        let specs = compile(&raw).expect("valid");
        assert!(specs[0].crf());
        assert!(!specs[0].has_missing());
    }

    #[test]
    fn arity_and_duplicates() {
        let too_long = RawFieldSpec::Parts(vec!["a".into(), "String".into(), "crf".into(), "x".into()]);
        assert!(matches!(compile(&[too_long]), Err(FieldError::InvalidArity { .. })));

        let empty = RawFieldSpec::Parts(Vec::new());
        assert!(matches!(compile(&[empty]), Err(FieldError::InvalidArity { .. })));

        let dup: Vec<RawFieldSpec> = vec!["a".into(), ("a", "Exact").into()];
        assert_eq!(compile(&dup), Err(FieldError::DuplicateField("a".into())));
    }

    #[test]
    fn deserializes_from_mixed_json() {
        let raw: Vec<RawFieldSpec> =
            serde_json::from_str(r#"["name", ["price", "Price"], ["phone", "String", "crf"]]"#)
                .expect("json");
        assert!(raw[0].is_bare());
        assert!(!raw[1].is_bare());
        let specs = compile(&raw).expect("valid");
        assert_eq!(specs[1].field_type, FieldType::Price);
        assert!(specs[2].crf());
    }
}
