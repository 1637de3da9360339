//! Term list persistence
//!
//! Reads all four list keys in one call and writes one key per mutation,
//! so an edit to one list never clobbers a concurrent edit to another.

use log::debug;
use serde_json::Map;

use crate::lists::{ListKey, Lists, TermList};
use crate::platform::{KeyValueStore, PlatformError};

/// Load all four term lists. Missing or malformed entries load empty.
pub async fn load_lists<S: KeyValueStore>(store: &S) -> Result<Lists, PlatformError> {
    let keys = ListKey::ALL.map(ListKey::storage_key);
    let data = store.get(&keys).await?;
    Ok(Lists::from_storage(&data))
}

/// Persist a single term list under its own key.
pub async fn save_list<S: KeyValueStore>(
    store: &S,
    key: ListKey,
    list: &TermList,
) -> Result<(), PlatformError> {
    let mut items = Map::new();
    items.insert(key.storage_key().to_string(), list.to_value());
    store.set(items).await?;
    debug!("saved {} ({} terms)", key.storage_key(), list.len());
    Ok(())
}

/// Edit applied to a term list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermEdit {
    Add(String),
    Remove(String),
}

impl TermEdit {
    /// Apply to `list`, returning whether it changed.
    pub fn apply(&self, list: &mut TermList) -> bool {
        match self {
            Self::Add(term) => list.add(term),
            Self::Remove(term) => list.remove(term),
        }
    }
}

/// Read-modify-write one list. Only writes when the edit changed it.
///
/// Returns the list as it stands after the edit.
pub async fn edit_list<S: KeyValueStore>(
    store: &S,
    key: ListKey,
    edit: &TermEdit,
) -> Result<TermList, PlatformError> {
    let lists = load_lists(store).await?;
    let mut list = lists.get(key).clone();
    if edit.apply(&mut list) {
        save_list(store, key, &list).await?;
    }
    Ok(list)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    /// In-memory store that records every write.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub data: RefCell<Map<String, Value>>,
        pub writes: RefCell<Vec<Vec<String>>>,
        pub fail: bool,
    }

    impl MemoryStore {
        pub fn with(value: Value) -> Self {
            let data = match value {
                Value::Object(m) => m,
                _ => Map::new(),
            };
            Self {
                data: RefCell::new(data),
                ..Default::default()
            }
        }
    }

    impl KeyValueStore for MemoryStore {
        async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, PlatformError> {
            if self.fail {
                return Err(PlatformError::new("storage unavailable"));
            }
            let data = self.data.borrow();
            Ok(keys
                .iter()
                .filter_map(|k| data.get(*k).map(|v| (k.to_string(), v.clone())))
                .collect())
        }

        async fn set(&self, items: Map<String, Value>) -> Result<(), PlatformError> {
            if self.fail {
                return Err(PlatformError::new("storage unavailable"));
            }
            self.writes.borrow_mut().push(items.keys().cloned().collect());
            self.data.borrow_mut().extend(items);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_load_coerces_malformed_values() {
        let store = MemoryStore::with(json!({
            "blacklistNames": "not-an-array",
            "greylistNames": ["sess"],
        }));
        let lists = load_lists(&store).await.unwrap();
        assert!(lists.black_names.is_empty());
        assert!(lists.black_values.is_empty());
        assert_eq!(lists.grey_names.as_slice(), &["sess".to_string()]);
    }

    #[tokio::test]
    async fn test_save_writes_only_its_key() {
        let store = MemoryStore::with(json!({"greylistNames": ["keep"]}));
        let list: TermList = ["track"].into_iter().collect();
        save_list(&store, ListKey::BlacklistNames, &list).await.unwrap();
        assert_eq!(*store.writes.borrow(), vec![vec!["blacklistNames".to_string()]]);
        assert_eq!(store.data.borrow()["greylistNames"], json!(["keep"]));
        assert_eq!(store.data.borrow()["blacklistNames"], json!(["track"]));
    }

    #[tokio::test]
    async fn test_edit_list_skips_noop_write() {
        let store = MemoryStore::with(json!({"blacklistValues": ["abc"]}));
        let list = edit_list(&store, ListKey::BlacklistValues, &TermEdit::Add("abc".into()))
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert!(store.writes.borrow().is_empty());

        let list = edit_list(&store, ListKey::BlacklistValues, &TermEdit::Remove("abc".into()))
            .await
            .unwrap();
        assert!(list.is_empty());
        assert_eq!(store.data.borrow()["blacklistValues"], json!([]));
    }

    #[tokio::test]
    async fn test_load_propagates_platform_error() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        let err = load_lists(&store).await.unwrap_err();
        assert_eq!(err.to_string(), "storage unavailable");
    }
}
