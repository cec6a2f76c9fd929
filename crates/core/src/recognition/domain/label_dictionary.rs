use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shared::constants::UNKNOWN_LABEL;

/// Bijection between dense integer ids and person names.
///
/// Ids are handed out as `0, 1, 2, ...` in assignment order. On disk the
/// dictionary is a JSON object from id to name, e.g. `{"0": "Alice"}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<i32, String>", try_from = "BTreeMap<i32, String>")]
pub struct LabelDictionary {
    names: Vec<String>,
}

impl LabelDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` and returns its id.
    ///
    /// Every call yields a fresh id, even for a name that is already
    /// present; two datasets with the same label stay distinguishable.
    pub fn assign(&mut self, name: impl Into<String>) -> i32 {
        self.names.push(name.into());
        (self.names.len() - 1) as i32
    }

    /// Name for `id`, or `"Unknown"` when the id was never assigned.
    pub fn resolve(&self, id: i32) -> &str {
        self.get(id).unwrap_or(UNKNOWN_LABEL)
    }

    pub fn get(&self, id: i32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (i as i32, name.as_str()))
    }
}

impl From<LabelDictionary> for BTreeMap<i32, String> {
    fn from(dict: LabelDictionary) -> Self {
        dict.names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (i as i32, name))
            .collect()
    }
}

impl TryFrom<BTreeMap<i32, String>> for LabelDictionary {
    type Error = String;

    /// Ids must be exactly `0..n`; gaps or negative ids are rejected.
    fn try_from(map: BTreeMap<i32, String>) -> Result<Self, Self::Error> {
        let mut names = Vec::with_capacity(map.len());
        for (expected, (id, name)) in map.into_iter().enumerate() {
            if id != expected as i32 {
                return Err(format!(
                    "label ids must be contiguous from 0, found {id} where {expected} was expected"
                ));
            }
            names.push(name);
        }
        Ok(Self { names })
    }
}
