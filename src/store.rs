//! Generic in-memory collection with a durable mirror.
//!
//! An [`EntityStore`] owns the authoritative ordered sequence of one entity
//! kind. Every mutation rewrites the whole collection to its storage slot.
//! A failed write is logged and leaves the store session-only; the in-memory
//! state is never rolled back.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::storage::{SlotStorage, StorageError};

pub type EntityId = i64;

/// A persisted record kind.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Storage slot holding this collection
    const COLLECTION: &'static str;

    /// Partial update. Unset fields leave the entity untouched.
    type Patch: Default;

    fn id(&self) -> EntityId;

    fn title(&self) -> &str;

    /// Type-specific defaults for a freshly created entity
    fn with_id(id: EntityId) -> Self;

    /// Shallow merge of `patch` over `self`. Must not change the id.
    fn apply(&mut self, patch: Self::Patch);

    /// Runs once after defaults and the caller's fields are merged on create
    fn on_create(&mut self) {}

    /// Bring a record read from storage back within its field bounds
    fn normalize(&mut self) {}

    /// Collection used when nothing (or nothing readable) is stored
    fn seed() -> Vec<Self> {
        Vec::new()
    }
}

/// Case-insensitive free-text matching
pub trait Searchable {
    /// `term` is already lowercased and non-empty
    fn matches_search(&self, term: &str) -> bool;
}

/// Kinds whose order is curated by hand
pub trait Sequenced: Entity {}

/// A field-specific comparison used by [`EntityStore::sort_by`]
pub trait SortKey<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("Unknown sort direction: {}", other)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

pub struct EntityStore<T: Entity> {
    items: Vec<T>,
    storage: Rc<dyn SlotStorage>,
    last_id: EntityId,
    synced: bool,
}

impl<T: Entity> fmt::Debug for EntityStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("collection", &T::COLLECTION)
            .field("len", &self.items.len())
            .field("synced", &self.synced)
            .finish()
    }
}

impl<T: Entity> EntityStore<T> {
    /// Load the collection from its slot.
    ///
    /// A missing slot, an unreadable backend or malformed JSON all fall back
    /// to [`Entity::seed`]. Only an unreadable backend marks the store
    /// unsynced, since its mirror state is unknown.
    pub fn load(storage: Rc<dyn SlotStorage>) -> Self {
        let (items, synced) = match storage.read(T::COLLECTION) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<T>>(&json) {
                Ok(items) => (items, true),
                Err(e) => {
                    warn!(
                        collection = T::COLLECTION,
                        error = %e,
                        "malformed collection, falling back to seed data"
                    );
                    (T::seed(), true)
                }
            },
            Ok(None) => (T::seed(), true),
            Err(e) => {
                warn!(
                    collection = T::COLLECTION,
                    error = %e,
                    "failed to read collection, continuing session-only"
                );
                (T::seed(), false)
            }
        };
        Self::from_parts(dedup_ids(items), storage, synced)
    }

    /// Start from `items` without reading the slot
    pub fn with_items(items: Vec<T>, storage: Rc<dyn SlotStorage>) -> Self {
        Self::from_parts(dedup_ids(items), storage, true)
    }

    fn from_parts(mut items: Vec<T>, storage: Rc<dyn SlotStorage>, synced: bool) -> Self {
        items.iter_mut().for_each(T::normalize);
        let last_id = items.iter().map(|e| e.id()).max().unwrap_or(0);
        debug!(collection = T::COLLECTION, len = items.len(), "collection loaded");
        Self {
            items,
            storage,
            last_id,
            synced,
        }
    }

    /// Ids follow the wall clock in milliseconds but never repeat or go
    /// backwards within a store.
    fn next_id(&mut self) -> EntityId {
        let now = chrono::Utc::now().timestamp_millis();
        let id = now.max(self.last_id + 1);
        self.last_id = id;
        id
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.items)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.write(T::COLLECTION, &json));
        match result {
            Ok(()) => {
                if !self.synced {
                    debug!(collection = T::COLLECTION, "durable mirror back in sync");
                }
                self.synced = true;
            }
            Err(e) => {
                warn!(
                    collection = T::COLLECTION,
                    error = %e,
                    "failed to persist collection, keeping in-memory state"
                );
                self.synced = false;
            }
        }
    }

    /// Append a new entity built from the type defaults plus `fields`
    pub fn create(&mut self, fields: T::Patch) -> T {
        let id = self.next_id();
        let mut entity = T::with_id(id);
        entity.apply(fields);
        entity.on_create();
        self.items.push(entity.clone());
        self.persist();
        entity
    }

    /// Merge `patch` into the entity with `id`.
    ///
    /// Returns `false`, and leaves everything untouched, when no entity has
    /// that id.
    pub fn update(&mut self, id: EntityId, patch: T::Patch) -> bool {
        self.update_with(id, |entity| entity.apply(patch))
    }

    /// Mutate the entity with `id` in place. Same no-op rule as [`update`].
    ///
    /// [`update`]: EntityStore::update
    pub fn update_with(&mut self, id: EntityId, f: impl FnOnce(&mut T)) -> bool {
        let Some(entity) = self.items.iter_mut().find(|e| e.id() == id) else {
            debug!(collection = T::COLLECTION, id, "update ignored, id not found");
            return false;
        };
        f(entity);
        self.persist();
        true
    }

    /// Drop the entity with `id`; `false` if there was none
    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.items.len();
        self.items.retain(|e| e.id() != id);
        if self.items.len() == before {
            debug!(collection = T::COLLECTION, id, "remove ignored, id not found");
            return false;
        }
        self.persist();
        true
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.iter().find(|e| e.id() == id)
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|e| predicate(e))
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `false` while the durable mirror is behind the in-memory state
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Entities matching `predicate`, in collection order
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.items.iter().filter(|e| predicate(e)).cloned().collect()
    }

    /// Stable sort of a copy of the collection
    pub fn sort_by<K: SortKey<T>>(&self, key: &K, direction: SortDirection) -> Vec<T> {
        let mut sorted = self.items.clone();
        sort_slice(&mut sorted, key, direction);
        sorted
    }
}

impl<T: Entity + Searchable> EntityStore<T> {
    /// Entities matching `term`; everything when the term is blank
    pub fn search(&self, term: &str) -> Vec<T> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.items.clone();
        }
        self.filter(|e| e.matches_search(&term))
    }
}

impl<T: Sequenced> EntityStore<T> {
    /// Move the element at `old_index` to `new_index`, shifting the ones
    /// between. Out-of-range indices leave the order unchanged.
    pub fn reorder(&mut self, old_index: usize, new_index: usize) -> bool {
        let len = self.items.len();
        if old_index >= len || new_index >= len {
            debug!(
                collection = T::COLLECTION,
                old_index, new_index, len, "reorder ignored, index out of range"
            );
            return false;
        }
        if old_index == new_index {
            return true;
        }
        let entity = self.items.remove(old_index);
        self.items.insert(new_index, entity);
        self.persist();
        true
    }
}

/// Stable sort honouring `direction`; equal keys keep their relative order
pub fn sort_slice<T, K: SortKey<T>>(items: &mut [T], key: &K, direction: SortDirection) {
    match direction {
        SortDirection::Asc => items.sort_by(|a, b| key.compare(a, b)),
        SortDirection::Desc => items.sort_by(|a, b| key.compare(b, a)),
    }
}

/// Title order, available for every entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByTitle;

impl<T: Entity> SortKey<T> for ByTitle {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        cmp_text(a.title(), b.title())
    }
}

impl FromStr for ByTitle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(ByTitle),
            other => Err(format!("Only `title` sorting is available here, got: {}", other)),
        }
    }
}

fn dedup_ids<T: Entity>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    let before = items.len();
    let items: Vec<T> = items.into_iter().filter(|e| seen.insert(e.id())).collect();
    if items.len() != before {
        warn!(
            collection = T::COLLECTION,
            dropped = before - items.len(),
            "duplicate ids in stored collection, keeping first occurrence"
        );
    }
    items
}

/// Compare optional values with `None` after every `Some`
pub fn cmp_present_first<V: Ord>(a: &Option<V>, b: &Option<V>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Lexicographic comparison ignoring ASCII and Unicode case
pub fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Case-insensitive substring test; `term` must already be lowercase
pub fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Card {
        id: EntityId,
        title: String,
        rank: u8,
    }

    #[derive(Default)]
    struct CardPatch {
        title: Option<String>,
        rank: Option<u8>,
    }

    impl Entity for Card {
        const COLLECTION: &'static str = "cards";
        type Patch = CardPatch;

        fn id(&self) -> EntityId {
            self.id
        }

        fn title(&self) -> &str {
            &self.title
        }

        fn with_id(id: EntityId) -> Self {
            Card {
                id,
                title: String::new(),
                rank: 0,
            }
        }

        fn apply(&mut self, patch: CardPatch) {
            if let Some(title) = patch.title {
                self.title = title;
            }
            if let Some(rank) = patch.rank {
                self.rank = rank;
            }
        }

        fn seed() -> Vec<Self> {
            vec![Card {
                id: 1,
                title: "seed".into(),
                rank: 0,
            }]
        }
    }

    impl Sequenced for Card {}

    struct ByRank;

    impl SortKey<Card> for ByRank {
        fn compare(&self, a: &Card, b: &Card) -> Ordering {
            a.rank.cmp(&b.rank)
        }
    }

    fn titled(title: &str, rank: u8) -> CardPatch {
        CardPatch {
            title: Some(title.to_string()),
            rank: Some(rank),
        }
    }

    fn empty_store() -> (Rc<MemoryStorage>, EntityStore<Card>) {
        let storage = Rc::new(MemoryStorage::new());
        let store = EntityStore::with_items(Vec::new(), storage.clone());
        (storage, store)
    }

    fn titles(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn ids_are_unique_and_increasing_within_a_burst() {
        let (_, mut store) = empty_store();
        let ids: Vec<EntityId> = (0..50).map(|_| store.create(CardPatch::default()).id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn create_writes_the_whole_collection() {
        let (storage, mut store) = empty_store();
        store.create(titled("a", 1));
        store.create(titled("b", 2));
        let json = storage.read("cards").unwrap().unwrap();
        let stored: Vec<Card> = serde_json::from_str(&json).unwrap();
        assert_eq!(stored, store.all());
    }

    #[test]
    fn missing_slot_loads_seed() {
        let storage = Rc::new(MemoryStorage::new());
        let store: EntityStore<Card> = EntityStore::load(storage);
        assert_eq!(titles(store.all()), vec!["seed"]);
        assert!(store.is_synced());
    }

    #[test]
    fn malformed_slot_loads_seed() {
        let storage = Rc::new(MemoryStorage::new());
        storage.insert_raw("cards", "{not json");
        let store: EntityStore<Card> = EntityStore::load(storage);
        assert_eq!(titles(store.all()), vec!["seed"]);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let storage = Rc::new(MemoryStorage::new());
        storage.insert_raw(
            "cards",
            r#"[{"id":5,"title":"first","rank":0},{"id":5,"title":"second","rank":0}]"#,
        );
        let mut store: EntityStore<Card> = EntityStore::load(storage);
        assert_eq!(titles(store.all()), vec!["first"]);
        assert!(store.create(CardPatch::default()).id > 5);
    }

    #[test]
    fn write_failure_keeps_memory_state() {
        let (storage, mut store) = empty_store();
        storage.set_fail_writes(true);
        let card = store.create(titled("offline", 1));
        assert!(!store.is_synced());
        assert_eq!(store.get(card.id).unwrap().title, "offline");

        storage.set_fail_writes(false);
        assert!(store.update(card.id, titled("online", 1)));
        assert!(store.is_synced());
        assert!(storage.read("cards").unwrap().unwrap().contains("online"));
    }

    #[test]
    fn update_with_unknown_id_does_not_write() {
        let (storage, mut store) = empty_store();
        store.create(titled("a", 1));
        let before = storage.read("cards").unwrap();
        storage.set_fail_writes(true);
        assert!(!store.update(-1, titled("x", 9)));
        assert!(store.is_synced());
        assert_eq!(storage.read("cards").unwrap(), before);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let (_, mut store) = empty_store();
        store.create(titled("a", 2));
        store.create(titled("b", 1));
        store.create(titled("c", 2));
        store.create(titled("d", 1));
        assert_eq!(
            titles(&store.sort_by(&ByRank, SortDirection::Asc)),
            vec!["b", "d", "a", "c"]
        );
        assert_eq!(
            titles(&store.sort_by(&ByRank, SortDirection::Desc)),
            vec!["a", "c", "b", "d"]
        );
        // sorting never touches the stored order
        assert_eq!(titles(store.all()), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn reorder_out_of_range_is_ignored() {
        let (_, mut store) = empty_store();
        store.create(titled("a", 0));
        store.create(titled("b", 0));
        assert!(!store.reorder(0, 2));
        assert!(!store.reorder(5, 0));
        assert_eq!(titles(store.all()), vec!["a", "b"]);
        assert!(store.reorder(1, 0));
        assert_eq!(titles(store.all()), vec!["b", "a"]);
    }

    #[test]
    fn optional_values_sort_missing_last() {
        assert_eq!(cmp_present_first(&Some(1), &None), Ordering::Less);
        assert_eq!(cmp_present_first::<i32>(&None, &None), Ordering::Equal);
        assert_eq!(cmp_present_first(&Some(2), &Some(1)), Ordering::Greater);
    }

    #[test]
    fn sort_direction_parses() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
