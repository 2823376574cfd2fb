use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::SkillDefinition;

/// Discovered skills keyed by slug, in first-seen order.
///
/// Inserting a slug that already exists replaces the definition but keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<SkillDefinition>", into = "Vec<SkillDefinition>")]
pub struct Catalog {
    entries: Vec<(String, SkillDefinition)>,
    index: HashMap<String, usize>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the definition's slug; the later definition wins.
    pub fn insert(&mut self, skill: SkillDefinition) {
        let slug = skill.slug();
        match self.index.get(&slug) {
            Some(&pos) => self.entries[pos].1 = skill,
            None => {
                self.index.insert(slug.clone(), self.entries.len());
                self.entries.push((slug, skill));
            },
        }
    }

    /// Insert every entry of `other`, in its order.
    pub fn merge(&mut self, other: Catalog) {
        for (_, skill) in other.entries {
            self.insert(skill);
        }
    }

    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&SkillDefinition> {
        self.index.get(slug).map(|&pos| &self.entries[pos].1)
    }

    #[must_use]
    pub fn contains(&self, slug: &str) -> bool {
        self.index.contains_key(slug)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(slug, definition)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SkillDefinition)> {
        self.entries.iter().map(|(slug, skill)| (slug.as_str(), skill))
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(slug, _)| slug.as_str())
    }

    pub fn skills(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.entries.iter().map(|(_, skill)| skill)
    }
}

impl From<Vec<SkillDefinition>> for Catalog {
    fn from(skills: Vec<SkillDefinition>) -> Self {
        skills.into_iter().collect()
    }
}

impl From<Catalog> for Vec<SkillDefinition> {
    fn from(catalog: Catalog) -> Self {
        catalog.entries.into_iter().map(|(_, skill)| skill).collect()
    }
}

impl FromIterator<SkillDefinition> for Catalog {
    fn from_iter<I: IntoIterator<Item = SkillDefinition>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for skill in iter {
            catalog.insert(skill);
        }
        catalog
    }
}
