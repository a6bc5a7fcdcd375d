//! Output buckets: one dataset per source id, plus the aggregate ones.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Feat, Monster, Spell};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataSetHeader {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<DataSetHeader>,
    pub sources: Vec<Source>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spells: Vec<Spell>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub feats: Vec<Feat>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub monsters: Vec<Monster>,
}

impl DataSet {
    pub fn add_source(&mut self, id: &str) {
        if !self.sources.iter().any(|source| source.id == id) {
            self.sources.push(Source { id: id.to_string() });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_none()
            && self.spells.is_empty()
            && self.feats.is_empty()
            && self.monsters.is_empty()
    }
}

/// Datasets keyed by lowercase name, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct DataSetCollection {
    lang: String,
    sets: BTreeMap<String, DataSet>,
}

impl DataSetCollection {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            sets: BTreeMap::new(),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Returns the named dataset, creating it with the collection language.
    pub fn resolve(&mut self, name: &str) -> &mut DataSet {
        let lang = (!self.lang.is_empty()).then(|| self.lang.clone());
        self.sets
            .entry(name.to_lowercase())
            .or_insert_with(|| DataSet {
                lang,
                ..DataSet::default()
            })
    }

    pub fn get(&self, name: &str) -> Option<&DataSet> {
        self.sets.get(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataSet)> {
        self.sets.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn names(&self) -> Vec<&str> {
        self.sets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::DataSetCollection;

    #[test]
    fn resolve_is_case_insensitive_and_sets_lang() {
        let mut sets = DataSetCollection::new("fr-FR");
        sets.resolve("Bestiary").add_source("bestiary");
        sets.resolve("bestiary").add_source("bestiary");
        sets.resolve("spells");

        assert_eq!(sets.names(), vec!["bestiary", "spells"]);
        let bestiary = sets.get("BESTIARY").expect("dataset");
        assert_eq!(bestiary.lang.as_deref(), Some("fr-FR"));
        assert_eq!(bestiary.sources.len(), 1);
        assert!(bestiary.is_empty());
    }

    #[test]
    fn empty_lang_leaves_datasets_without_lang() {
        let mut sets = DataSetCollection::new("");
        assert!(sets.resolve("feats").lang.is_none());
    }
}
