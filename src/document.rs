use std::path::Path;
use std::time::Duration;

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::config::ShellConfig;
use crate::error::LoadError;

/// A parsed HTML document together with where it came from.
pub struct Document {
    source: String,
    html: Html,
}

impl Document {
    /// Parse `html`. Parsing is lenient: malformed markup still yields a tree.
    pub fn parse(source: impl Into<String>, html: &str) -> Self {
        Self {
            source: source.into(),
            html: Html::parse_document(html),
        }
    }

    /// File path or URL the document was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("source", &self.source).finish()
    }
}

/// Loads documents from local files or over HTTP(S).
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    user_agent: String,
    timeout: Duration,
}

impl DocumentLoader {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ShellConfig) -> Self {
        Self::new(
            config.user_agent.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn load(&self, source: &str) -> Result<Document, LoadError> {
        if is_url(source) {
            self.fetch(source)
        } else {
            let path = source.strip_prefix("file://").unwrap_or(source);
            load_file(Path::new(path), source)
        }
    }

    fn fetch(&self, url: &str) -> Result<Document, LoadError> {
        debug!(url, timeout = ?self.timeout, "fetching document");
        let fetch_err = |source: reqwest::Error| LoadError::Fetch {
            url: url.to_string(),
            source,
        };
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .build()
            .map_err(fetch_err)?;
        let response = client.get(url).send().map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(fetch_err)?;
        debug!(url, bytes = body.len(), "fetched document");
        Ok(Document::parse(url, &body))
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::from_config(&ShellConfig::default())
    }
}

fn load_file(path: &Path, source: &str) -> Result<Document, LoadError> {
    let body = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), bytes = body.len(), "read document");
    Ok(Document::parse(source, &body))
}

fn is_url(source: &str) -> bool {
    let lower = source.get(..8).unwrap_or(source).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
