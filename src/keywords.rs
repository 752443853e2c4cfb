//! BIDS keyword blocks and their cross-product expansion.
//!
//! A block declares an ordered mapping from BIDS keyword (`acq`, `flip`,
//! `mt`, ... plus the mandatory `MODALITY` entry) to a list of candidate
//! values. Expansion materializes every concrete keyword→value assignment,
//! with the last-declared keyword varying fastest. Declaration order is
//! load-bearing: it fixes the order of `_<keyword>-<value>` segments in the
//! file stems that downstream BIDS parsers see.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reserved keyword naming the imaging contrast (`T1w`, `MTS`, ...).
///
/// Its value becomes the primary filename token; it never appears as a
/// `MODALITY-...` segment.
pub const MODALITY_KEY: &str = "MODALITY";

/// A keyword value: BIDS allows both textual (`MTon`) and numeric (`1`)
/// modifier values, and they format identically in stems.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for KeywordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordValue::Number(n) => write!(f, "{n}"),
            KeywordValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for KeywordValue {
    fn from(s: &str) -> Self { KeywordValue::Text(s.to_string()) }
}

impl From<String> for KeywordValue {
    fn from(s: String) -> Self { KeywordValue::Text(s) }
}

impl From<i64> for KeywordValue {
    fn from(n: i64) -> Self { KeywordValue::Number(n) }
}

/// One declarative block: ordered keyword → non-empty list of values.
///
/// Multiple blocks may be declared per subject; each is expanded
/// independently and the results concatenated. Blocks are never
/// cross-multiplied with each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordSpec {
    entries: Vec<(String, Vec<KeywordValue>)>,
}

impl KeywordSpec {
    pub fn new() -> Self { Self::default() }

    /// Shorthand for the "simple dataset" case: a block containing nothing
    /// but a list of contrasts.
    pub fn contrasts<V: Into<KeywordValue>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::new().keyword(MODALITY_KEY, values)
    }

    /// Append a keyword with its candidate values. Declaration order is
    /// preserved in every expanded stem.
    pub fn keyword<V: Into<KeywordValue>>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.entries.push((key.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn from_entries(entries: Vec<(String, Vec<KeywordValue>)>) -> Self {
        Self { entries }
    }

    /// Fail fast on specs that would collapse the cross-product to zero
    /// outputs, or that omit the contrast keyword the layout rules need.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(Error::Configuration("keyword block is empty".into()));
        }
        for (key, values) in &self.entries {
            if values.is_empty() {
                return Err(Error::Configuration(format!(
                    "keyword `{key}` has an empty value list"
                )));
            }
        }
        if !self.entries.iter().any(|(key, _)| key == MODALITY_KEY) {
            return Err(Error::Configuration(format!(
                "keyword block lacks the mandatory `{MODALITY_KEY}` entry"
            )));
        }
        Ok(())
    }

    /// The full cross-product of all value lists, in row-major order: the
    /// last-declared keyword varies fastest. Output length is the product of
    /// the value-list lengths.
    pub fn expand(&self) -> Result<Vec<Combination>> {
        self.validate()?;
        let combinations = self
            .entries
            .iter()
            .map(|(_, values)| values.iter())
            .multi_cartesian_product()
            .map(|chosen| {
                let mut modality = None;
                let mut modifiers = Vec::with_capacity(chosen.len() - 1);
                for ((key, _), value) in self.entries.iter().zip(chosen) {
                    if key == MODALITY_KEY {
                        modality = Some(value.clone());
                    } else {
                        modifiers.push((key.clone(), value.clone()));
                    }
                }
                Combination {
                    // validate() guarantees the modality entry exists
                    modality: modality.unwrap(),
                    modifiers,
                }
            })
            .collect();
        Ok(combinations)
    }
}

/// One fully-resolved assignment: exactly one value per declared keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    modality: KeywordValue,
    modifiers: Vec<(String, KeywordValue)>,
}

impl Combination {
    /// The contrast value, used as the primary filename token and as the
    /// sidecar's series/protocol description.
    pub fn modality(&self) -> &KeywordValue { &self.modality }

    /// Non-modality keyword→value pairs, in declaration order.
    pub fn modifiers(&self) -> impl Iterator<Item = (&str, &KeywordValue)> {
        self.modifiers.iter().map(|(k, v)| (k.as_str(), v))
    }
}
