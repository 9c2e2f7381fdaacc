//! The phrase catalog: the ordered set of translatable strings an
//! application knows about.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Ordered sequence of unique phrases. The first occurrence of a phrase
/// decides its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseSet {
    phrases: Vec<String>,
    seen: HashSet<String>,
}

impl PhraseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phrase. Returns `false` if it was already present.
    pub fn insert(&mut self, phrase: impl Into<String>) -> bool {
        let phrase = phrase.into();
        if self.seen.contains(&phrase) {
            return false;
        }
        self.seen.insert(phrase.clone());
        self.phrases.push(phrase);
        true
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.seen.contains(phrase)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Parse a catalog from JSON.
    ///
    /// Accepts either an array of strings or an object whose string values
    /// are the phrases (the shape i18n libraries use for phrase maps). Both
    /// keep the order of the file.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).context("Phrase catalog is not valid JSON")?;

        let items: Vec<&serde_json::Value> = match &value {
            serde_json::Value::Array(items) => items.iter().collect(),
            serde_json::Value::Object(map) => map.values().collect(),
            _ => bail!("Phrase catalog must be a JSON array or object"),
        };

        let mut set = PhraseSet::new();
        for item in items {
            match item.as_str() {
                Some(phrase) => {
                    set.insert(phrase);
                }
                None => bail!("Phrase catalog entries must be strings, found {}", item),
            }
        }
        Ok(set)
    }

    /// Read a catalog file (see [`PhraseSet::from_json`]).
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read phrase catalog {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse phrase catalog {}", path.display()))
    }
}

impl<S: Into<String>> FromIterator<S> for PhraseSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = PhraseSet::new();
        for phrase in iter {
            set.insert(phrase);
        }
        set
    }
}
