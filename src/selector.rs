//! CSS selector handling over `scraper`.
//!
//! An expression is a CSS selector optionally followed by `@attribute`, in
//! which case the attribute value is extracted instead of the element text.
//! A bare `@attribute` reads from the scope element itself.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::document::Document;
use crate::error::SelectorError;

static ATTRIBUTE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?s)(?P<css>.*?)\s*@(?P<attr>[A-Za-z_][-A-Za-z0-9_:.]*)$")
        .expect("attribute suffix pattern is valid")
});

/// A parsed expression, ready to run against a document or element.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    css: Option<Selector>,
    attribute: Option<String>,
}

impl CompiledSelector {
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorHandler;

impl SelectorHandler {
    pub fn make(&self, expression: &str) -> Result<CompiledSelector, SelectorError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }
        if looks_like_xpath(trimmed) {
            return Err(SelectorError::XPath(trimmed.to_string()));
        }

        let (css_part, attribute) = match ATTRIBUTE_SUFFIX.captures(trimmed) {
            Some(caps) => (caps["css"].to_string(), Some(caps["attr"].to_string())),
            None => (trimmed.to_string(), None),
        };

        let css = if css_part.is_empty() {
            None
        } else {
            let selector = Selector::parse(&css_part).map_err(|e| SelectorError::Invalid {
                expression: trimmed.to_string(),
                message: e.to_string(),
            })?;
            Some(selector)
        };

        Ok(CompiledSelector { css, attribute })
    }

    /// Every value the selector produces anywhere in the document.
    pub fn extract(&self, document: &Document, selector: &CompiledSelector) -> Vec<String> {
        match &selector.css {
            Some(css) => document
                .html()
                .select(css)
                .filter_map(|el| element_value(el, selector.attribute()))
                .collect(),
            None => element_value(document.root(), selector.attribute())
                .into_iter()
                .collect(),
        }
    }

    /// Elements matching the selector below `scope`. Without a CSS part the
    /// scope itself is the only match.
    pub fn select_in<'a>(
        &self,
        scope: ElementRef<'a>,
        selector: &CompiledSelector,
    ) -> Vec<ElementRef<'a>> {
        match &selector.css {
            Some(css) => scope.select(css).collect(),
            None => vec![scope],
        }
    }

    /// The first value the selector produces below `scope`.
    pub fn first_in(&self, scope: ElementRef<'_>, selector: &CompiledSelector) -> Option<String> {
        self.select_in(scope, selector)
            .into_iter()
            .find_map(|el| element_value(el, selector.attribute()))
    }
}

fn element_value(el: ElementRef<'_>, attribute: Option<&str>) -> Option<String> {
    match attribute {
        Some(name) => el.value().attr(name).map(|v| v.trim().to_string()),
        None => Some(normalize_ws(&el.text().collect::<String>())),
    }
}

/// Collapse runs of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn looks_like_xpath(expr: &str) -> bool {
    expr.starts_with('/')
        || expr.starts_with("./")
        || expr.starts_with("..")
        || expr.starts_with('(')
        || expr.contains("::")
}
