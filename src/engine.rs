//! Runs a whole parselet against a document.
//!
//! Keys follow `name[?|!][(scope)]`:
//! - `?` marks the property optional (the default), `!` required.
//! - A scope narrows the context. Lists produce one object per scope match;
//!   objects and scalars use the first match.
//!
//! Scalars yield the first value of their expression within their context. Missing optional values are left out of the result.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use serde_json::{Map, Value};
use tracing::debug;

use crate::document::Document;
use crate::error::{ExtractError, SelectorError};
use crate::parselet::{Parselet, Rule};
use crate::selector::SelectorHandler;

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?s)(?P<name>[^()!?]+)(?P<op>[?!])?(?:\((?P<scope>.*)\))?$")
        .expect("key pattern is valid")
});

/// Selector and extraction collaborator used by a session.
pub trait Extractor {
    /// Evaluate a single expression against the whole document.
    fn test(&self, document: &Document, expression: &str) -> Result<Value, SelectorError>;

    /// Run a full parselet and return the structured result.
    fn extract(&self, document: &Document, parselet: &Parselet) -> Result<Value, ExtractError>;
}

#[derive(Debug, Clone, Default)]
pub struct CssExtractor {
    handler: SelectorHandler,
}

impl CssExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn evaluate(
        &self,
        context: ElementRef<'_>,
        parselet: &Parselet,
    ) -> Result<Map<String, Value>, ExtractError> {
        let mut out = Map::new();

        for (key, rule) in parselet.iter() {
            let parsed = ParsedKey::parse(key)?;
            let value = match rule {
                Rule::Scalar(expr) => {
                    let selector = self.handler.make(expr)?;
                    self.first_scope(context, parsed.scope)?
                        .and_then(|el| self.handler.first_in(el, &selector))
                        .map(Value::String)
                }
                Rule::Object(nested) => match self.first_scope(context, parsed.scope)? {
                    Some(el) => Some(Value::Object(self.evaluate(el, nested)?)),
                    None => None,
                },
                Rule::List(template) => {
                    let targets = match parsed.scope {
                        Some(scope) => self.scopes(context, scope)?,
                        None => vec![context],
                    };
                    let mut items = Vec::with_capacity(targets.len());
                    for el in targets {
                        let item = self.evaluate(el, template)?;
                        if !item.is_empty() {
                            items.push(Value::Object(item));
                        }
                    }
                    Some(Value::Array(items))
                }
            };

            match value {
                Some(v) => {
                    out.insert(parsed.name.to_string(), v);
                }
                None if parsed.required => {
                    return Err(ExtractError::MissingRequired(parsed.name.to_string()));
                }
                None => debug!(key = %key, "no match, property omitted"),
            }
        }

        Ok(out)
    }

    /// The element a scalar or object key is evaluated in: the first scope
    /// match, or `context` itself for an unscoped key.
    fn first_scope<'a>(
        &self,
        context: ElementRef<'a>,
        scope: Option<&str>,
    ) -> Result<Option<ElementRef<'a>>, SelectorError> {
        match scope {
            Some(scope) => Ok(self.scopes(context, scope)?.into_iter().next()),
            None => Ok(Some(context)),
        }
    }

    fn scopes<'a>(
        &self,
        context: ElementRef<'a>,
        scope: &str,
    ) -> Result<Vec<ElementRef<'a>>, SelectorError> {
        let selector = self.handler.make(scope)?;
        Ok(self.handler.select_in(context, &selector))
    }
}

impl Extractor for CssExtractor {
    fn test(&self, document: &Document, expression: &str) -> Result<Value, SelectorError> {
        let selector = self.handler.make(expression)?;
        let values = self.handler.extract(document, &selector);
        Ok(Value::Array(values.into_iter().map(Value::String).collect()))
    }

    fn extract(&self, document: &Document, parselet: &Parselet) -> Result<Value, ExtractError> {
        self.evaluate(document.root(), parselet).map(Value::Object)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ParsedKey<'a> {
    name: &'a str,
    required: bool,
    scope: Option<&'a str>,
}

impl<'a> ParsedKey<'a> {
    fn parse(key: &'a str) -> Result<Self, ExtractError> {
        let caps = KEY_PATTERN
            .captures(key)
            .ok_or_else(|| ExtractError::MalformedKey(key.to_string()))?;
        let name = caps.name("name").map_or("", |m| m.as_str()).trim();
        if name.is_empty() {
            return Err(ExtractError::MalformedKey(key.to_string()));
        }
        Ok(Self {
            name,
            required: caps.name("op").is_some_and(|m| m.as_str() == "!"),
            scope: caps.name("scope").map(|m| m.as_str()),
        })
    }
}
