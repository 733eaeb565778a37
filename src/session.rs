//! The in-progress parselet and every mutation applied to it.
//!
//! A [`Session`] owns the loaded document, the output destination and the
//! parselet being authored. The document and the parselet are independent:
//! loading another document keeps accumulated properties unless a new
//! parselet is started explicitly.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::config::ShellConfig;
use crate::document::{Document, DocumentLoader};
use crate::engine::{CssExtractor, Extractor};
use crate::error::{SelectorError, SessionError};
use crate::parselet::key::Kind;
use crate::parselet::{Parselet, Rule};

/// Where the parselet stands relative to its last save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing added since the parselet was started.
    Empty,
    /// Changed since the last save (or never saved).
    Unsaved,
    /// Saved and unchanged since.
    Persisted,
}

pub struct Session {
    document: Document,
    output: PathBuf,
    parselet: Parselet,
    loader: DocumentLoader,
    extractor: Box<dyn Extractor>,
    indent: usize,
    persisted: bool,
}

impl Session {
    /// Start a session on an already-loaded document with an empty parselet.
    pub fn new(document: Document, output: impl Into<PathBuf>) -> Self {
        Self {
            document,
            output: output.into(),
            parselet: Parselet::new(),
            loader: DocumentLoader::default(),
            extractor: Box::new(CssExtractor::new()),
            indent: ShellConfig::default().indent,
            persisted: false,
        }
    }

    /// Load `source` and start a session on it.
    pub fn open(
        source: &str,
        output: impl Into<PathBuf>,
        config: &ShellConfig,
    ) -> Result<Self, SessionError> {
        let loader = DocumentLoader::from_config(config);
        let document = loader.load(source)?;
        Ok(Self::new(document, output)
            .with_loader(loader)
            .with_indent(config.indent))
    }

    pub fn with_loader(mut self, loader: DocumentLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn parselet(&self) -> &Parselet {
        &self.parselet
    }

    pub fn state(&self) -> SessionState {
        if self.persisted {
            SessionState::Persisted
        } else if self.parselet.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Unsaved
        }
    }

    /// Evaluate `expression` against the current document. Never changes the
    /// session.
    pub fn test(&self, expression: &str) -> Result<Value, SessionError> {
        Ok(self.extractor.test(&self.document, expression)?)
    }

    /// Record `name -> expression`, replacing any property with the same name.
    pub fn add_simple(&mut self, name: &str, expression: &str) -> Result<(), SessionError> {
        validate_name(name)?;
        validate_expression(expression)?;
        self.parselet.set_property(name, expression, Kind::Scalar);
        self.touch();
        debug!(name, expression, "added simple property");
        Ok(())
    }

    /// Record a list or object property with an empty nested template.
    ///
    /// A property already stored under the same name, whatever its kind, is
    /// replaced rather than left behind under its old key.
    pub fn add_aggregating(
        &mut self,
        name: &str,
        expression: &str,
        is_list: bool,
    ) -> Result<(), SessionError> {
        validate_name(name)?;
        validate_expression(expression)?;
        let kind = if is_list { Kind::List } else { Kind::Object };
        let key = self.parselet.set_property(name, expression, kind);
        self.touch();
        debug!(%kind, key = %key, "added aggregating property");
        Ok(())
    }

    pub fn add_list(&mut self, name: &str, expression: &str) -> Result<(), SessionError> {
        self.add_aggregating(name, expression, true)
    }

    pub fn add_object(&mut self, name: &str, expression: &str) -> Result<(), SessionError> {
        self.add_aggregating(name, expression, false)
    }

    /// Record a simple property inside the list or object property named
    /// `parent_name`. List templates always keep exactly one element.
    pub fn add_nested(
        &mut self,
        parent_name: &str,
        name: &str,
        expression: &str,
    ) -> Result<(), SessionError> {
        validate_name(name)?;
        validate_expression(expression)?;

        if self.parselet.key_for(parent_name).is_none() {
            return Err(SessionError::InvalidParent {
                name: parent_name.to_string(),
                valid: self.parselet.names(),
            });
        }

        let Some(target) = self
            .parselet
            .rule_for_mut(parent_name)
            .and_then(Rule::nested_mut)
        else {
            return Err(SessionError::ScalarParent {
                name: parent_name.to_string(),
            });
        };

        target.set_property(name, expression, Kind::Scalar);
        self.touch();
        debug!(parent = parent_name, name, expression, "added nested property");
        Ok(())
    }

    /// Remove a top-level property by bare name.
    pub fn remove(&mut self, name: &str) -> Result<(), SessionError> {
        match self.parselet.remove(name) {
            Some((key, _)) => {
                self.touch();
                debug!(key = %key, "removed property");
                Ok(())
            }
            None => Err(SessionError::InvalidParent {
                name: name.to_string(),
                valid: self.parselet.names(),
            }),
        }
    }

    /// Run the whole parselet against the current document.
    pub fn extract(&self) -> Result<Value, SessionError> {
        Ok(self.extractor.extract(&self.document, &self.parselet)?)
    }

    /// Write the parselet to `path`, overwriting it. The parselet stays in
    /// place and can keep growing afterwards. Only a write to the session's
    /// output destination counts as saved.
    pub fn persist(&mut self, path: &Path) -> Result<PathBuf, SessionError> {
        self.parselet.save(path, self.indent)?;
        if path == self.output {
            self.persisted = true;
        }
        info!(path = %path.display(), properties = self.parselet.len(), "wrote parselet");
        Ok(path.to_path_buf())
    }

    /// Write the parselet to the session's output destination.
    pub fn save(&mut self) -> Result<PathBuf, SessionError> {
        let output = self.output.clone();
        self.persist(&output)
    }

    /// Load another document. With `output` set, the output destination is
    /// redirected and a new, empty parselet is started; otherwise accumulated
    /// properties are kept. On failure nothing changes.
    pub fn fetch(&mut self, source: &str, output: Option<PathBuf>) -> Result<(), SessionError> {
        let document = self.loader.load(source)?;
        debug!(source, "loaded document");
        self.document = document;
        if let Some(output) = output {
            self.start_new(Some(output));
        }
        Ok(())
    }

    /// Discard the in-progress parselet, optionally redirecting the output.
    pub fn start_new(&mut self, output: Option<PathBuf>) {
        if let Some(output) = output {
            self.output = output;
        }
        self.parselet = Parselet::new();
        self.persisted = false;
        debug!(output = %self.output.display(), "started new parselet");
    }

    /// Replace the in-progress parselet with one read from `path`. Resuming
    /// the output destination itself leaves nothing unsaved.
    pub fn resume(&mut self, path: &Path) -> Result<usize, SessionError> {
        self.parselet = Parselet::load(path)?;
        self.persisted = path == self.output;
        debug!(path = %path.display(), properties = self.parselet.len(), "resumed parselet");
        Ok(self.parselet.len())
    }

    fn touch(&mut self) {
        self.persisted = false;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("document", &self.document)
            .field("output", &self.output)
            .field("parselet", &self.parselet)
            .field("state", &self.state())
            .finish()
    }
}

/// Names end up inside keys parsed by the extraction engine, so the key
/// punctuation is off limits.
fn validate_name(name: &str) -> Result<(), SessionError> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.contains(['(', ')', '!', '?']) {
        "must not contain '(', ')', '!' or '?'"
    } else {
        return Ok(());
    };
    Err(SessionError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// Empty expressions would only fail later, at extraction time.
fn validate_expression(expression: &str) -> Result<(), SessionError> {
    if expression.trim().is_empty() {
        return Err(SelectorError::Empty.into());
    }
    Ok(())
}
