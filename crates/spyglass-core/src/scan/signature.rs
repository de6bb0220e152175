//! Wildcard byte signatures.
//!
//! Signatures are parsed from the usual textual form: whitespace-separated
//! hex byte tokens, with `??` (or `?`) marking a position that matches any
//! byte. Named signatures can be persisted to JSON so scans can be driven
//! from a saved catalog.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A byte pattern with wildcard positions, e.g. `"48 8B ?? 05"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<Option<u8>>,
}

impl Signature {
    /// Parse a textual pattern. Empty patterns and malformed tokens are
    /// rejected.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut bytes = Vec::new();
        for token in pattern.split_whitespace() {
            if token == "??" || token == "?" {
                bytes.push(None);
                continue;
            }

            let value = u8::from_str_radix(token, 16).map_err(|e| {
                Error::InvalidPattern(format!("Invalid signature token '{}': {}", token, e))
            })?;
            bytes.push(Some(value));
        }

        if bytes.is_empty() {
            return Err(Error::InvalidPattern(
                "Signature pattern is empty".to_string(),
            ));
        }

        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[Option<u8>] {
        &self.bytes
    }

    /// Whether the signature matches at the start of `window`.
    pub fn matches_at(&self, window: &[u8]) -> bool {
        if window.len() < self.bytes.len() {
            return false;
        }
        self.bytes
            .iter()
            .zip(window)
            .all(|(pattern, byte)| pattern.is_none_or(|value| value == *byte))
    }

    /// Offset of the first match within `buffer`, scanning forward.
    pub fn find_in(&self, buffer: &[u8]) -> Option<usize> {
        if self.bytes.is_empty() || self.bytes.len() > buffer.len() {
            return None;
        }
        buffer
            .windows(self.bytes.len())
            .position(|window| self.matches_at(window))
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .bytes
            .iter()
            .map(|b| match b {
                Some(value) => format!("{:02X}", value),
                None => "??".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&text)
    }
}

/// A named signature as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub name: String,
    pub pattern: String,
}

impl SignatureEntry {
    pub fn signature(&self) -> Result<Signature> {
        Signature::parse(&self.pattern)
    }
}

/// A catalog of named signatures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureSet {
    pub entries: Vec<SignatureEntry>,
}

impl SignatureSet {
    pub fn entry(&self, name: &str) -> Option<&SignatureEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }
}

pub fn load_signature_set<P: AsRef<Path>>(path: P) -> Result<SignatureSet> {
    let content = fs::read_to_string(&path)?;
    let set = serde_json::from_str(&content)?;
    Ok(set)
}

pub fn save_signature_set<P: AsRef<Path>>(path: P, set: &SignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(set)?;
    fs::write(path, content)?;
    Ok(())
}
