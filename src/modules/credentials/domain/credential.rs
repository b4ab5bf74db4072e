use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// An API key used to authenticate one remote call.
///
/// `Display` masks the key so it can be written to logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            write!(f, "****")
        } else {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            write!(f, "...{}", tail)
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential({})", self)
    }
}

/// Ordered credential pool shared by the orchestrator and key rotation.
///
/// Readers take a snapshot; saving settings swaps the whole list.
#[derive(Clone, Default)]
pub struct CredentialPool {
    keys: Arc<RwLock<Vec<Credential>>>,
}

impl CredentialPool {
    pub fn new(keys: Vec<Credential>) -> Self {
        Self {
            keys: Arc::new(RwLock::new(keys)),
        }
    }

    /// Build a pool from raw key strings, dropping blanks and duplicates
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(normalize(keys))
    }

    pub fn snapshot(&self) -> Vec<Credential> {
        self.keys
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn get(&self, index: usize) -> Option<Credential> {
        self.keys
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(index)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.keys
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn replace<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized = normalize(keys);
        let mut guard = self
            .keys
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = normalized;
    }
}

fn normalize<I, S>(keys: I) -> Vec<Credential>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<Credential> = Vec::new();
    for key in keys {
        let trimmed = key.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        let credential = Credential::new(trimmed);
        if !out.contains(&credential) {
            out.push(credential);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_masks_key() {
        let credential = Credential::new("AIzaSyExampleKey1234");
        assert_eq!(credential.to_string(), "...1234");
        assert_eq!(Credential::new("abc").to_string(), "****");
    }

    #[test]
    fn test_pool_drops_blank_and_duplicate_keys() {
        let pool = CredentialPool::from_keys(["k1", " ", "k2", "k1 "]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(1), Some(Credential::new("k2")));
    }

    #[test]
    fn test_replace_is_visible_to_clones() {
        let pool = CredentialPool::from_keys(["k1"]);
        let shared = pool.clone();
        pool.replace(["a", "b", "c"]);
        assert_eq!(shared.len(), 3);
    }
}
