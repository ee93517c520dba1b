//! Placement of collections in the category tree, for filter assignment.

use std::collections::HashMap;

use super::{CollectionFilter, CollectionRecord};
use crate::app_config::CodePolicy;
use crate::paths::JOIN_SEPARATOR;
use crate::slug::slugify;

/// A non-root collection with its depth below the root and its path of names.
///
/// `depth == 0` means the collection is not reachable from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCollection {
    pub id: i64,
    pub depth: usize,
    pub levels: Vec<String>,
}

impl PlacedCollection {
    /// The code a facet value for this collection's path would carry.
    #[must_use]
    pub fn code(&self, policy: CodePolicy) -> String {
        match policy {
            CodePolicy::FullPath => slugify(&self.levels.join(JOIN_SEPARATOR)),
            CodePolicy::Leaf => slugify(self.levels.last().map_or("", String::as_str)),
        }
    }

    /// The filter to store, given the matching facet value.
    #[must_use]
    pub fn filter(&self, facet_value_id: i64) -> CollectionFilter {
        CollectionFilter {
            collection_id: self.id,
            facet_value_id,
            inherit_filters: self.depth > 1,
        }
    }
}

/// Place every non-root collection relative to `root_id`, ordered by id.
#[must_use]
pub fn place_collections(collections: &[CollectionRecord], root_id: i64) -> Vec<PlacedCollection> {
    let by_id: HashMap<i64, &CollectionRecord> = collections.iter().map(|c| (c.id, c)).collect();

    let mut placed: Vec<PlacedCollection> = collections
        .iter()
        .filter(|c| c.id != root_id && !c.is_root)
        .map(|c| {
            let mut names = vec![c.name.clone()];
            let mut parent = c.parent_id;
            let mut reached_root = false;
            // A tree deeper than the collection count has a cycle.
            for _ in 0..collections.len() {
                match parent {
                    Some(id) if id == root_id => {
                        reached_root = true;
                        break;
                    }
                    Some(id) => match by_id.get(&id) {
                        Some(p) => {
                            names.push(p.name.clone());
                            parent = p.parent_id;
                        }
                        None => break,
                    },
                    None => break,
                }
            }
            names.reverse();
            PlacedCollection {
                id: c.id,
                depth: if reached_root { names.len() } else { 0 },
                levels: names,
            }
        })
        .collect();

    placed.sort_by_key(|p| p.id);
    placed
}
