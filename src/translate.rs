//! Path translation from local base paths to the remote media prefix.
//!
//! Matching is plain substring containment: a candidate base is found
//! anywhere in the text, not only at path-segment boundaries, and only the
//! first occurrence is replaced. Callers rely on that simple substitution,
//! so `/home/u/Music` also matches inside `/srv/home/u/Musicals/...`.

use crate::error::ConfigError;

/// Ordered local prefixes that are all synced to the same remote prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePathSet {
    bases: Vec<String>,
}

impl BasePathSet {
    /// Build the set, stripping trailing separators. Duplicates keep their
    /// first position.
    pub fn new<I, S>(bases: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for base in bases {
            let raw = base.as_ref();
            let trimmed = raw.trim_end_matches('/');
            if trimmed.is_empty() {
                return Err(ConfigError::EmptyBasePath(raw.to_string()));
            }
            if !out.iter().any(|b| b == trimmed) {
                out.push(trimmed.to_string());
            }
        }
        if out.is_empty() {
            return Err(ConfigError::NoMediaDirs);
        }
        Ok(Self { bases: out })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.bases.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// Outcome of translating one path-bearing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    Rewritten { original: String, translated: String },
    Unmatched { original: String },
}

impl RewriteResult {
    /// The value to write back: the translation, or the original untouched.
    pub fn value(&self) -> &str {
        match self {
            Self::Rewritten { translated, .. } => translated,
            Self::Unmatched { original } => original,
        }
    }

    pub fn into_value(self) -> String {
        match self {
            Self::Rewritten { translated, .. } => translated,
            Self::Unmatched { original } => original,
        }
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten { .. })
    }
}

/// Rewrites local base paths to a single remote base.
#[derive(Debug, Clone)]
pub struct PathTranslator {
    bases: BasePathSet,
    remote_base: String,
}

impl PathTranslator {
    pub fn new(bases: BasePathSet, remote_base: impl Into<String>) -> Self {
        let remote_base = remote_base.into();
        let remote_base = match remote_base.trim_end_matches('/') {
            "" => remote_base,
            trimmed => trimmed.to_string(),
        };
        Self { bases, remote_base }
    }

    pub fn bases(&self) -> &BasePathSet {
        &self.bases
    }

    pub fn remote_base(&self) -> &str {
        &self.remote_base
    }

    /// Replace the first occurrence of the first candidate (in declared
    /// order) that appears in `text`.
    pub fn translate(&self, text: &str) -> RewriteResult {
        match self.bases.iter().find(|base| text.contains(base)) {
            Some(base) => RewriteResult::Rewritten {
                original: text.to_string(),
                translated: text.replacen(base, &self.remote_base, 1),
            },
            None => RewriteResult::Unmatched {
                original: text.to_string(),
            },
        }
    }
}
