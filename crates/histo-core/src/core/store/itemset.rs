use super::{JsonStoreExt, KeyProvider, RecordStore, StoreError};
use crate::core::utils::timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const PIPELINE_CREATOR: &str = "pipeline";
pub const ALGORITHM_CREATION: &str = "algorithm";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSetMetadata {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A named, ordered, duplicate-free list of structure identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSet {
    pub last_updated: Option<String>,
    pub members: Vec<String>,
    pub created_by: String,
    pub creation_type: String,
    #[serde(default)]
    pub redirection: Option<String>,
    pub context: String,
    pub metadata: ItemSetMetadata,
}

impl ItemSet {
    pub fn new(context: &str, slug: &str, title: &str, description: &str) -> Self {
        Self {
            last_updated: None,
            members: Vec::new(),
            created_by: PIPELINE_CREATOR.to_string(),
            creation_type: ALGORITHM_CREATION.to_string(),
            redirection: None,
            context: context.to_string(),
            metadata: ItemSetMetadata {
                title: title.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
            },
        }
    }

    pub fn slug(&self) -> &str {
        &self.metadata.slug
    }

    pub fn contains(&self, member: &str) -> bool {
        let member = member.trim();
        self.members.iter().any(|m| m == member)
    }

    /// Appends members not already present, keeping first-seen order.
    /// Returns how many were added.
    pub fn add_members<I, S>(&mut self, members: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut present: HashSet<String> = self.members.iter().cloned().collect();
        let before = self.members.len();
        for member in members {
            let member = member.as_ref().trim();
            if !member.is_empty() && present.insert(member.to_string()) {
                self.members.push(member.to_string());
            }
        }
        self.members.len() - before
    }

    /// Returns how many members were removed.
    pub fn remove_members<I, S>(&mut self, members: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let to_remove: HashSet<String> = members
            .into_iter()
            .map(|m| m.as_ref().trim().to_string())
            .collect();
        let before = self.members.len();
        self.members.retain(|m| !to_remove.contains(m));
        before - self.members.len()
    }

    fn normalise(&mut self) {
        let members = std::mem::take(&mut self.members);
        self.add_members(members);
    }
}

/// Lower-case slug with runs of non-alphanumerics collapsed to `_`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Item-set operations over a record store.
pub struct ItemSetStore<'a> {
    store: &'a dyn RecordStore,
    keys: KeyProvider,
}

impl<'a> ItemSetStore<'a> {
    pub fn new(store: &'a dyn RecordStore, keys: KeyProvider) -> Self {
        Self { store, keys }
    }

    pub fn key(&self, context: &str, slug: &str) -> String {
        self.keys.set_key(context, slug)
    }

    pub fn get(&self, context: &str, slug: &str) -> Result<Option<ItemSet>, StoreError> {
        self.store.get_json(&self.key(context, slug))
    }

    pub fn exists(&self, context: &str, slug: &str) -> Result<bool, StoreError> {
        self.store.exists(&self.key(context, slug))
    }

    /// Stamps, de-duplicates and writes `set`.
    pub fn put(&self, set: &mut ItemSet) -> Result<(), StoreError> {
        set.normalise();
        set.last_updated = Some(timestamp());
        let key = self.key(&set.context, set.slug());
        self.store.put_json(&key, set)
    }

    /// Creates the set, replacing any set stored under the same slug.
    pub fn create(
        &self,
        context: &str,
        slug: &str,
        title: &str,
        description: &str,
        members: &[String],
    ) -> Result<ItemSet, StoreError> {
        let mut set = ItemSet::new(context, slug, title, description);
        set.add_members(members);
        self.put(&mut set)?;
        Ok(set)
    }

    /// The set as it would be after adding `members`, created when absent.
    /// Nothing is written.
    pub fn prepare_create_or_update(
        &self,
        context: &str,
        slug: &str,
        title: &str,
        description: &str,
        members: &[String],
    ) -> Result<ItemSet, StoreError> {
        let mut set = self
            .get(context, slug)?
            .unwrap_or_else(|| ItemSet::new(context, slug, title, description));
        set.add_members(members);
        set.normalise();
        set.last_updated = Some(timestamp());
        Ok(set)
    }

    pub fn create_or_update(
        &self,
        context: &str,
        slug: &str,
        title: &str,
        description: &str,
        members: &[String],
    ) -> Result<ItemSet, StoreError> {
        let mut set = self.prepare_create_or_update(context, slug, title, description, members)?;
        self.put(&mut set)?;
        Ok(set)
    }

    /// `None` when the set does not exist.
    pub fn add_members(
        &self,
        context: &str,
        slug: &str,
        members: &[String],
    ) -> Result<Option<ItemSet>, StoreError> {
        let Some(mut set) = self.get(context, slug)? else {
            return Ok(None);
        };
        set.add_members(members);
        self.put(&mut set)?;
        Ok(Some(set))
    }

    pub fn remove_members(
        &self,
        context: &str,
        slug: &str,
        members: &[String],
    ) -> Result<Option<ItemSet>, StoreError> {
        let Some(mut set) = self.get(context, slug)? else {
            return Ok(None);
        };
        set.remove_members(members);
        self.put(&mut set)?;
        Ok(Some(set))
    }

    /// Stored sets as `context/slug` references.
    pub fn list(&self, context: Option<&str>) -> Result<Vec<String>, StoreError> {
        let keys = self.store.list(&self.keys.set_prefix(context))?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix("sets/").map(str::to_string))
            .collect())
    }
}
