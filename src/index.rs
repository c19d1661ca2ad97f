//! In-memory index of the flat item list with derived paths.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{CloudError, Result};
use crate::models::{Item, ItemType};

/// Point-in-time snapshot of the remote items.
///
/// Items are keyed by ID and carry their absolute path once computed. The
/// path map keeps the IDs found at every path, ordered by path.
#[derive(Debug, Default)]
pub struct Index {
    items: HashMap<String, Item>,
    tree: BTreeMap<String, Vec<String>>,
}

impl Index {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a listing. Later duplicates of an ID replace
    /// earlier ones.
    pub fn build(list: Vec<Item>) -> Result<Self> {
        let mut index = Self::new();

        // preserve listing order within a path
        let mut order: Vec<String> = Vec::with_capacity(list.len());
        for mut item in list {
            item.path = None;
            if !index.items.contains_key(&item.id) {
                order.push(item.id.clone());
            }
            index.items.insert(item.id.clone(), item);
        }

        for id in &order {
            index.resolve_path(id)?;
        }

        for id in order {
            index.add_to_tree(&id);
        }

        Ok(index)
    }

    /// Add a single new item, e.g. a folder created by this client.
    ///
    /// Its parent must already be in the index and its ID must not be.
    pub fn insert(&mut self, mut item: Item) -> Result<&Item> {
        let id = item.id.clone();
        if self.items.contains_key(&id) {
            return Err(CloudError::Consistency(format!("item {} is already indexed", id)));
        }
        item.path = None;

        self.items.insert(id.clone(), item);
        if let Err(e) = self.resolve_path(&id) {
            self.items.remove(&id);
            return Err(e);
        }
        self.add_to_tree(&id);

        self.items
            .get(&id)
            .ok_or_else(|| CloudError::Consistency(format!("item {} vanished from index", id)))
    }

    /// Look up an item by ID.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// First item of the given type at a path. Not finding one is normal.
    pub fn find_first(&self, path: &str, item_type: ItemType) -> Option<&Item> {
        let path = normalize_path(path);
        self.tree
            .get(&path)?
            .iter()
            .filter_map(|id| self.items.get(id))
            .find(|item| item.item_type == item_type)
    }

    /// Items grouped by path, in path order.
    pub fn tree(&self) -> impl Iterator<Item = (&str, Vec<&Item>)> + '_ {
        self.tree.iter().map(move |(path, ids)| {
            let items = ids.iter().filter_map(|id| self.items.get(id)).collect();
            (path.as_str(), items)
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compute and cache the path of an item and all its uncached ancestors.
    ///
    /// Walks parent links iteratively; a parent that is missing or already
    /// seen on this walk makes the metadata inconsistent.
    fn resolve_path(&mut self, id: &str) -> Result<String> {
        let mut chain: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = id.to_string();

        let base = loop {
            let item = self.items.get(&current).ok_or_else(|| {
                CloudError::Consistency(format!("unknown ID {} referenced as parent", current))
            })?;

            if let Some(path) = &item.path {
                break path.clone();
            }
            if !visited.insert(current.clone()) {
                return Err(CloudError::Consistency(format!(
                    "cyclic parent chain at {}",
                    current
                )));
            }

            chain.push(current.clone());
            if item.parent.is_empty() {
                break String::new();
            }
            current = item.parent.clone();
        };

        let mut path = base;
        for link in chain.iter().rev() {
            if let Some(item) = self.items.get_mut(link) {
                path = format!("{}/{}", path, item.visible_name);
                item.path = Some(path.clone());
            }
        }

        Ok(path)
    }

    fn add_to_tree(&mut self, id: &str) {
        if let Some(path) = self.items.get(id).and_then(|item| item.path.clone()) {
            self.tree.entry(path).or_default().push(id.to_string());
        }
    }
}

/// Turn `a/b/`, `/a/b`, `a//b` or `a/b` into `/a/b`; empty input stays empty.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .fold(String::new(), |mut normalized, segment| {
            normalized.push('/');
            normalized.push_str(segment);
            normalized
        })
}
