//! Attribute rules for request bodies.
//!
//! Every mutating endpoint declares a [`Schema`]: the mutable attributes with
//! their value rules, plus the attributes that exist on the stored resource
//! but can never be written through the API. Bodies are read as a
//! [`RawObject`] first so that duplicate keys survive parsing and count
//! against the attribute limit, then converted into the endpoint's typed
//! input.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Attributes that are owned by the system or by the relationship endpoints.
pub const IMMUTABLE_ATTRIBUTES: &[&str] = &["id", "owner", "client", "services"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The request body must be a JSON object")]
    Malformed,
    #[error("The request object must include at least one attribute")]
    Empty,
    #[error("The request object is missing at least one of the required attributes")]
    MissingAttribute,
    #[error("The request object includes at least one unsupported attribute")]
    UnsupportedAttribute,
    #[error("The {0} attribute cannot be modified")]
    ImmutableAttribute(String),
    #[error("The price attribute must be a non-negative number")]
    InvalidPrice,
    #[error("The {field} attribute must be {expected}")]
    InvalidValue { field: String, expected: &'static str },
}

impl ValidationError {
    /// Immutable-attribute writes are refused as forbidden rather than bad requests.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ValidationError::ImmutableAttribute(_))
    }
}

/// Value rule for one mutable attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Text,
    Email,
    NonNegativeNumber,
}

#[derive(Debug)]
pub struct Schema {
    pub fields: &'static [(&'static str, FieldRule)],
    pub immutable: &'static [&'static str],
}

/// What a body is being validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Every mutable attribute, nothing else.
    Create,
    /// Every mutable attribute; immutable attributes are refused distinctly.
    Replace,
    /// A non-empty subset of the mutable attributes.
    Patch,
}

impl Schema {
    fn rule(&self, name: &str) -> Option<FieldRule> {
        self.fields.iter().find(|(f, _)| *f == name).map(|(_, r)| *r)
    }

    fn is_mutable(&self, name: &str) -> bool {
        self.rule(name).is_some()
    }

    /// Check attribute names against the shape, in the order the API reports
    /// violations: immutable, missing, unsupported.
    pub fn check_shape(&self, shape: Shape, body: &RawObject) -> Result<(), ValidationError> {
        if body.is_empty() && shape == Shape::Patch {
            return Err(ValidationError::Empty);
        }

        if shape != Shape::Create {
            if let Some(name) = body.keys().find(|k| self.immutable.contains(k)) {
                return Err(ValidationError::ImmutableAttribute(name.to_string()));
            }
        }

        if shape != Shape::Patch {
            let present: HashSet<&str> = body.keys().collect();
            if self.fields.iter().any(|(f, _)| !present.contains(f)) {
                return Err(ValidationError::MissingAttribute);
            }
        }

        if body.keys().any(|k| !self.is_mutable(k)) {
            return Err(ValidationError::UnsupportedAttribute);
        }
        // Also catches repeated keys that a plain map would have collapsed.
        if body.len() > self.fields.len() || body.has_duplicates() {
            return Err(ValidationError::UnsupportedAttribute);
        }
        Ok(())
    }

    /// Check each present attribute against its value rule.
    pub fn check_values(&self, body: &RawObject) -> Result<(), ValidationError> {
        for (name, value) in body.entries() {
            let Some(rule) = self.rule(name) else { continue };
            check_value(name, rule, value)?;
        }
        Ok(())
    }

    /// Parse a request body into the endpoint's typed input.
    pub fn parse<T: DeserializeOwned>(&self, shape: Shape, bytes: &[u8]) -> Result<T, ValidationError> {
        let body: RawObject = serde_json::from_slice(bytes).map_err(|_| ValidationError::Malformed)?;
        self.check_shape(shape, &body)?;
        self.check_values(&body)?;
        serde_json::from_value(Value::Object(body.into_map())).map_err(|_| ValidationError::Malformed)
    }
}

fn check_value(name: &str, rule: FieldRule, value: &Value) -> Result<(), ValidationError> {
    match rule {
        FieldRule::NonNegativeNumber => match value.as_f64() {
            Some(n) if value.is_number() && n >= 0.0 => Ok(()),
            _ => Err(ValidationError::InvalidPrice),
        },
        FieldRule::Text => match value.as_str() {
            Some(_) => Ok(()),
            None => Err(ValidationError::InvalidValue { field: name.to_string(), expected: "a string" }),
        },
        FieldRule::Email => match value.as_str() {
            Some(s) if s.contains('@') => Ok(()),
            _ => Err(ValidationError::InvalidValue { field: name.to_string(), expected: "an email address" }),
        },
    }
}

/// A JSON object with its keys in document order, duplicates included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObject(Vec<(String, Value)>);

impl RawObject {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has_duplicates(&self) -> bool {
        let mut seen = HashSet::new();
        !self.keys().all(|k| seen.insert(k))
    }

    /// Collapse into a map; later duplicates win.
    pub fn into_map(self) -> Map<String, Value> {
        self.0.into_iter().collect()
    }
}

impl<'de> Deserialize<'de> for RawObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawObjectVisitor;

        impl<'de> Visitor<'de> for RawObjectVisitor {
            type Value = RawObject;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawObject, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, Value>()? {
                    entries.push((k, v));
                }
                Ok(RawObject(entries))
            }

            fn visit_unit<E: de::Error>(self) -> Result<RawObject, E> {
                Err(E::invalid_type(de::Unexpected::Unit, &self))
            }
        }

        deserializer.deserialize_map(RawObjectVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static THING: Schema = Schema {
        fields: &[("name", FieldRule::Text), ("email", FieldRule::Email), ("price", FieldRule::NonNegativeNumber)],
        immutable: IMMUTABLE_ATTRIBUTES,
    };

    fn raw(s: &str) -> RawObject {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn raw_object_keeps_duplicate_keys() {
        let body = raw(r#"{"name":"a","name":"b"}"#);
        assert_eq!(body.len(), 2);
        assert!(body.has_duplicates());
        assert_eq!(body.into_map()["name"], "b");
    }

    #[test]
    fn non_objects_are_malformed() {
        for bad in ["[]", "\"x\"", "null", "{", "12"] {
            let err = THING.parse::<Value>(Shape::Create, bad.as_bytes()).unwrap_err();
            assert_eq!(err, ValidationError::Malformed, "{bad}");
        }
    }

    #[test]
    fn create_reports_missing_before_unsupported() {
        let body = raw(r#"{"name":"a","email":"a@b","extra":1}"#);
        assert_eq!(THING.check_shape(Shape::Create, &body), Err(ValidationError::MissingAttribute));
    }

    #[test]
    fn create_with_extra_attribute_is_unsupported() {
        let body = raw(r#"{"name":"a","email":"a@b","price":1,"colour":"red"}"#);
        assert_eq!(THING.check_shape(Shape::Create, &body), Err(ValidationError::UnsupportedAttribute));
    }

    #[test]
    fn create_treats_immutable_names_as_unsupported() {
        let body = raw(r#"{"name":"a","email":"a@b","price":1,"owner":"x"}"#);
        assert_eq!(THING.check_shape(Shape::Create, &body), Err(ValidationError::UnsupportedAttribute));
    }

    #[test]
    fn replace_refuses_immutable_attribute_distinctly() {
        let body = raw(r#"{"name":"a","email":"a@b","price":1,"services":[]}"#);
        let err = THING.check_shape(Shape::Replace, &body).unwrap_err();
        assert_eq!(err, ValidationError::ImmutableAttribute("services".into()));
        assert!(err.is_forbidden());
    }

    #[test]
    fn patch_rules() {
        assert_eq!(THING.check_shape(Shape::Patch, &raw("{}")), Err(ValidationError::Empty));
        assert_eq!(THING.check_shape(Shape::Patch, &raw(r#"{"id":3}"#)), Err(ValidationError::ImmutableAttribute("id".into())));
        assert_eq!(THING.check_shape(Shape::Patch, &raw(r#"{"nickname":"x"}"#)), Err(ValidationError::UnsupportedAttribute));
        assert_eq!(THING.check_shape(Shape::Patch, &raw(r#"{"price":3}"#)), Ok(()));
    }

    #[test]
    fn patch_rejects_duplicate_keys_even_within_the_limit() {
        let body = raw(r#"{"name":"a","name":"b"}"#);
        assert_eq!(THING.check_shape(Shape::Patch, &body), Err(ValidationError::UnsupportedAttribute));
        let over = raw(r#"{"name":"a","email":"a@b","price":1,"name":"b"}"#);
        assert_eq!(THING.check_shape(Shape::Patch, &over), Err(ValidationError::UnsupportedAttribute));
    }

    #[test]
    fn price_must_be_a_non_negative_number() {
        for bad in [r#"{"price":-1}"#, r#"{"price":"5"}"#, r#"{"price":null}"#, r#"{"price":-0.01}"#] {
            assert_eq!(THING.check_values(&raw(bad)), Err(ValidationError::InvalidPrice), "{bad}");
        }
        assert_eq!(THING.check_values(&raw(r#"{"price":0}"#)), Ok(()));
        assert_eq!(THING.check_values(&raw(r#"{"price":12.5}"#)), Ok(()));
    }

    #[test]
    fn text_and_email_rules() {
        assert!(matches!(
            THING.check_values(&raw(r#"{"name":7}"#)),
            Err(ValidationError::InvalidValue { expected: "a string", .. })
        ));
        assert!(matches!(
            THING.check_values(&raw(r#"{"email":"nobody"}"#)),
            Err(ValidationError::InvalidValue { expected: "an email address", .. })
        ));
    }

    #[test]
    fn parse_produces_typed_input() {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Input {
            name: String,
            email: String,
            price: serde_json::Number,
        }
        let input: Input = THING
            .parse(Shape::Create, br#"{"name":"Tow","email":"t@x.io","price":50}"#)
            .unwrap();
        assert_eq!(input.name, "Tow");
        assert_eq!(input.email, "t@x.io");
        assert_eq!(input.price.as_u64(), Some(50));
    }
}
