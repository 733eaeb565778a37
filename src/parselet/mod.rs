//! The parselet data model: an ordered mapping from property keys to rules.

pub mod key;

use std::fmt;
use std::path::Path;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParseletError, PersistError};
use key::{Kind, decode_name, encode};

/// Value side of a parselet entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Selector expression producing a single value.
    Scalar(String),
    /// Template for each repeated item. Serialized as a one-element sequence.
    List(Parselet),
    Object(Parselet),
}

impl Rule {
    /// The nested spec new properties are written into, if this rule has one.
    pub fn nested_mut(&mut self) -> Option<&mut Parselet> {
        match self {
            Rule::Scalar(_) => None,
            Rule::List(template) | Rule::Object(template) => Some(template),
        }
    }
}

/// Mapping from encoded property key to [`Rule`].
///
/// Insertion order is kept so written files read in the order properties were
/// authored. Keys are unique by bare name (see [`key::decode_name`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parselet {
    entries: Vec<(String, Rule)>,
}

impl Parselet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    /// Bare names of every property, in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(k, _)| decode_name(k).to_string())
            .collect()
    }

    /// The stored key whose bare name is `name`.
    pub fn key_for(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .map(|(k, _)| k.as_str())
            .find(|k| decode_name(k) == name)
    }

    /// Look up a rule by bare name.
    pub fn rule_for_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.entries
            .iter_mut()
            .find(|entry| decode_name(&entry.0) == name)
            .map(|entry| &mut entry.1)
    }

    /// Insert a rule under `key`, replacing any entry with the same bare name.
    ///
    /// A replaced entry keeps its position, even when its key changes (e.g. a
    /// scalar `items` becoming `items(li)`), so no stale key is left behind.
    /// Returns the previous rule for that bare name.
    pub fn insert(&mut self, key: String, rule: Rule) -> Option<Rule> {
        let name = decode_name(&key);
        match self.entries.iter().position(|(k, _)| decode_name(k) == name) {
            Some(idx) => {
                let (_, old) = std::mem::replace(&mut self.entries[idx], (key, rule));
                Some(old)
            }
            None => {
                self.entries.push((key, rule));
                None
            }
        }
    }

    /// Record a property of the given kind. Aggregating kinds get a fresh,
    /// empty nested template. Returns the key used.
    pub fn set_property(&mut self, name: &str, expression: &str, kind: Kind) -> String {
        let key = encode(name, expression, kind);
        let rule = match kind {
            Kind::Scalar => Rule::Scalar(expression.to_string()),
            Kind::List => Rule::List(Parselet::new()),
            Kind::Object => Rule::Object(Parselet::new()),
        };
        self.insert(key.clone(), rule);
        key
    }

    pub fn remove(&mut self, name: &str) -> Option<(String, Rule)> {
        let idx = self.entries.iter().position(|(k, _)| decode_name(k) == name)?;
        Some(self.entries.remove(idx))
    }

    /// Render as JSON with `indent` spaces per nesting level.
    pub fn to_json(&self, indent: usize) -> Result<String, serde_json::Error> {
        let indent = " ".repeat(indent);
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yml::Error> {
        serde_yml::to_string(self)
    }

    /// Serialize in the format implied by `path` and write it atomically.
    pub fn save(&self, path: &Path, indent: usize) -> Result<(), PersistError> {
        let text = match Format::from_path(path) {
            Format::Json => self.to_json(indent)?,
            Format::Yaml => self.to_yaml()?,
        };
        crate::fs::write_atomic(path, text.as_bytes()).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a parselet previously written by [`Parselet::save`] (or by hand).
    pub fn load(path: &Path) -> Result<Self, ParseletError> {
        let text = std::fs::read_to_string(path).map_err(|source| ParseletError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded: Result<Parselet, String> = match Format::from_path(path) {
            Format::Json => serde_json::from_str(&text).map_err(|e| e.to_string()),
            Format::Yaml => serde_yml::from_str(&text).map_err(|e| e.to_string()),
        };
        decoded.map_err(|message| ParseletError::Decode {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// On-disk format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

impl Serialize for Parselet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, rule) in &self.entries {
            map.serialize_entry(key, rule)?;
        }
        map.end()
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rule::Scalar(expr) => serializer.serialize_str(expr),
            Rule::List(template) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(template)?;
                seq.end()
            }
            Rule::Object(nested) => nested.serialize(serializer),
        }
    }
}

struct ParseletVisitor;

impl<'de> Visitor<'de> for ParseletVisitor {
    type Value = Parselet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of property keys to rules")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Parselet, A::Error> {
        let mut parselet = Parselet::new();
        while let Some((key, rule)) = access.next_entry::<String, Rule>()? {
            if let Some(existing) = parselet.key_for(decode_name(&key)) {
                return Err(de::Error::custom(format!(
                    "keys {existing:?} and {key:?} define the same property"
                )));
            }
            parselet.entries.push((key, rule));
        }
        Ok(parselet)
    }
}

impl<'de> Deserialize<'de> for Parselet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ParseletVisitor)
    }
}

struct RuleVisitor;

impl<'de> Visitor<'de> for RuleVisitor {
    type Value = Rule;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a selector string, a one-element list or a mapping")
    }

    fn visit_str<E: de::Error>(self, expr: &str) -> Result<Rule, E> {
        Ok(Rule::Scalar(expr.to_string()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Rule, A::Error> {
        let mut items = Vec::with_capacity(1);
        while let Some(item) = seq.next_element::<Parselet>()? {
            items.push(item);
        }
        if items.len() != 1 {
            return Err(de::Error::custom(format!(
                "list property must hold exactly one template, found {}",
                items.len()
            )));
        }
        Ok(Rule::List(items.remove(0)))
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Rule, A::Error> {
        ParseletVisitor.visit_map(access).map(Rule::Object)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RuleVisitor)
    }
}
