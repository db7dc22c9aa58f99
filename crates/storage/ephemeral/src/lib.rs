use std::sync::atomic::{AtomicUsize, Ordering};

use meigen_core::{errors::SourceError, traits::QuoteSource};
use parking_lot::RwLock;

#[derive(Debug)]
enum Content {
    Text(String),
    Missing,
    Denied,
    Broken(String),
}

/// In-memory dataset source. Contents can be swapped at runtime and every
/// read is counted, which lets callers observe cache behaviour.
pub struct EphemeralSource {
    content: RwLock<Content>,
    reads: AtomicUsize,
}

impl EphemeralSource {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            content: RwLock::new(Content::Text(text.into())),
            reads: AtomicUsize::new(0),
        }
    }

    /// A source holding `{"quotes": <quotes>}`.
    #[must_use]
    pub fn from_value(quotes: &serde_json::Value) -> Self {
        Self::new(format!("{{\"quotes\":{quotes}}}"))
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.content.write() = Content::Text(text.into());
    }

    pub fn set_missing(&self) {
        *self.content.write() = Content::Missing;
    }

    pub fn set_denied(&self) {
        *self.content.write() = Content::Denied;
    }

    pub fn set_broken(&self, msg: impl Into<String>) {
        *self.content.write() = Content::Broken(msg.into());
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Default for EphemeralSource {
    fn default() -> Self {
        Self::new("{\"quotes\":[]}")
    }
}

impl QuoteSource for EphemeralSource {
    fn read_raw(&self) -> Result<String, SourceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match &*self.content.read() {
            Content::Text(text) => Ok(text.clone()),
            Content::Missing => Err(SourceError::NotFound("ephemeral".into())),
            Content::Denied => Err(SourceError::PermissionDenied("ephemeral".into())),
            Content::Broken(msg) => Err(SourceError::Io(msg.clone())),
        }
    }

    fn describe(&self) -> String {
        "ephemeral".to_string()
    }
}
