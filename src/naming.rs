//! Mapping a field's position in a record to a source key.

use crate::error::Error;
use crate::walk::FieldPath;
use std::collections::{HashMap, hash_map::Entry};

/// How a single path segment is turned into words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordStyle {
    /// The declared name is used as-is
    #[default]
    Verbatim,
    /// The declared name is split on word boundaries and rejoined
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterCase {
    Upper,
    Lower,
}

/// Naming options of one loader, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStyle {
    /// First key segment; falls back to the loader's default when unset or empty
    pub prefix: Option<String>,
    pub words: WordStyle,
    pub case: LetterCase,
    /// Joins prefix, record and field segments
    pub separator: String,
    /// Joins the words of one segment under [`WordStyle::Split`]
    pub word_separator: String,
    /// Leave every enclosing record out of the key
    pub flatten: bool,
}

impl KeyStyle {
    /// `PREFIX_POSTGRES_PORT`
    pub fn env() -> Self {
        Self {
            prefix: None,
            words: WordStyle::Verbatim,
            case: LetterCase::Upper,
            separator: "_".to_string(),
            word_separator: "_".to_string(),
            flatten: false,
        }
    }

    /// `prefix-postgres-port`
    pub fn flag() -> Self {
        Self {
            prefix: None,
            words: WordStyle::Verbatim,
            case: LetterCase::Lower,
            separator: "-".to_string(),
            word_separator: "-".to_string(),
            flatten: false,
        }
    }

    /// The configured prefix, if it is set and non-empty
    pub fn explicit_prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// One segment after word styling, before letter casing
    pub fn segment(&self, name: &str) -> String {
        match self.words {
            WordStyle::Verbatim => name.to_string(),
            WordStyle::Split => split_words(name).join(&self.word_separator),
        }
    }

    /// Builds the key for `field` nested under `ancestors`.
    ///
    /// `default_prefix` is used only when no explicit prefix is configured.
    pub fn resolve(
        &self,
        default_prefix: Option<&str>,
        ancestors: &[&str],
        field: &str,
    ) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(ancestors.len() + 2);
        if let Some(prefix) = self.explicit_prefix().or(default_prefix) {
            parts.push(prefix.to_string());
        }
        parts.extend(ancestors.iter().map(|name| self.segment(name)));
        parts.push(self.segment(field));

        let key = parts.join(&self.separator);
        match self.case {
            LetterCase::Upper => key.to_uppercase(),
            LetterCase::Lower => key.to_lowercase(),
        }
    }

    /// Key of the leaf at `path`, dropping flattened ancestors
    pub(crate) fn resolve_path(&self, default_prefix: Option<&str>, path: &FieldPath) -> String {
        let ancestors: Vec<&str> = path
            .ancestors()
            .iter()
            .filter(|info| !self.flatten && !info.flatten)
            .map(|info| info.name)
            .collect();
        self.resolve(default_prefix, &ancestors, path.leaf().name)
    }

    /// Whether any enclosing record of `path` was left out of its key
    pub(crate) fn is_flattened(&self, path: &FieldPath) -> bool {
        !path.ancestors().is_empty()
            && (self.flatten || path.ancestors().iter().any(|info| info.flatten))
    }
}

/// Splits a name on `_`, `-`, `.`, case changes and letter/digit changes.
///
/// An acronym keeps its capitals together: `DBName` splits into `DB` and `Name`.
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();

    for chunk in name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|chunk| !chunk.is_empty())
    {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;

        for i in 1..chars.len() {
            let (prev, cur) = (chars[i - 1], chars[i]);
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());

            let boundary = (prev.is_lowercase() && cur.is_uppercase())
                || (prev.is_numeric() != cur.is_numeric())
                || (prev.is_uppercase() && cur.is_uppercase() && next_lower);

            if boundary {
                words.push(chars[start..i].iter().collect());
                start = i;
            }
        }
        words.push(chars[start..].iter().collect());
    }

    words
}

/// Tracks resolved keys within one record tree and rejects reuse.
///
/// A shared registry lets two fields read the same key as long as neither
/// got it by flattening.
#[derive(Debug, Default)]
pub(crate) struct KeyRegistry {
    seen: HashMap<String, (String, bool)>,
    shared: bool,
}

impl KeyRegistry {
    pub(crate) fn shared() -> Self {
        Self {
            seen: HashMap::new(),
            shared: true,
        }
    }

    pub(crate) fn claim(&mut self, key: &str, path: &str, flattened: bool) -> Result<(), Error> {
        match self.seen.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                let (first, first_flattened) = entry.get();
                if self.shared && !flattened && !first_flattened {
                    return Ok(());
                }
                Err(Error::DuplicateKey {
                    key: key.to_string(),
                    first: first.clone(),
                    second: path.to_string(),
                })
            }
            Entry::Vacant(entry) => {
                entry.insert((path.to_string(), flattened));
                Ok(())
            }
        }
    }
}
