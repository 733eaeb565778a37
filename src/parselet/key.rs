//! Encoding of property names into parselet keys.
//!
//! Simple properties are stored under their bare name. Aggregating (list or
//! object) properties carry their scope expression inside the key:
//! `name(expression)`. Lookups by humans always go through the bare name, so
//! [`decode_name`] must recover it from either form.
//!
//! Property names are assumed never to contain `(`. The codec does not check
//! this; [`crate::session::Session`] rejects such names before they get here.

use std::fmt;

/// Aggregation kind of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar,
    List,
    Object,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Scalar => "scalar",
            Kind::List => "list",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the mapping key for a property.
///
/// For [`Kind::Scalar`] this is just `name`; the expression is stored as the
/// value by the caller.
pub fn encode(name: &str, expression: &str, kind: Kind) -> String {
    match kind {
        Kind::Scalar => name.to_string(),
        Kind::List | Kind::Object => format!("{name}({expression})"),
    }
}

/// Strip everything from the first `(` or `?(` onward.
pub fn decode_name(key: &str) -> &str {
    match key.find('(') {
        Some(idx) => {
            let end = if key[..idx].ends_with('?') { idx - 1 } else { idx };
            &key[..end]
        }
        None => key,
    }
}
