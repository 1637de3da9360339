//! Blacklist / greylist term lists and their storage layout
//!
//! Four term lists persist under separate storage keys. Reads are lenient:
//! anything that is not a JSON array loads as an empty list.

use serde_json::{Map, Value};

// =============================================================================
// Storage Keys
// =============================================================================

/// Which list a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Blacklist,
    Greylist,
}

/// Which cookie attribute a term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    Names,
    Values,
}

/// One of the four persisted term lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKey {
    BlacklistNames,
    BlacklistValues,
    GreylistNames,
    GreylistValues,
}

impl ListKey {
    pub const ALL: [ListKey; 4] = [
        ListKey::BlacklistNames,
        ListKey::BlacklistValues,
        ListKey::GreylistNames,
        ListKey::GreylistValues,
    ];

    pub fn new(kind: ListKind, field: ListField) -> Self {
        match (kind, field) {
            (ListKind::Blacklist, ListField::Names) => Self::BlacklistNames,
            (ListKind::Blacklist, ListField::Values) => Self::BlacklistValues,
            (ListKind::Greylist, ListField::Names) => Self::GreylistNames,
            (ListKind::Greylist, ListField::Values) => Self::GreylistValues,
        }
    }

    /// Storage key the list persists under.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::BlacklistNames => "blacklistNames",
            Self::BlacklistValues => "blacklistValues",
            Self::GreylistNames => "greylistNames",
            Self::GreylistValues => "greylistValues",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.storage_key() == key)
    }

    pub fn kind(self) -> ListKind {
        match self {
            Self::BlacklistNames | Self::BlacklistValues => ListKind::Blacklist,
            Self::GreylistNames | Self::GreylistValues => ListKind::Greylist,
        }
    }

    pub fn field(self) -> ListField {
        match self {
            Self::BlacklistNames | Self::GreylistNames => ListField::Names,
            Self::BlacklistValues | Self::GreylistValues => ListField::Values,
        }
    }

    /// Human-readable label for the settings panel.
    pub fn label(self) -> &'static str {
        match self {
            Self::BlacklistNames => "Blacklist: names",
            Self::BlacklistValues => "Blacklist: values",
            Self::GreylistNames => "Greylist: names",
            Self::GreylistValues => "Greylist: values",
        }
    }
}

/// True if any of `keys` names one of the four term lists.
pub fn touches_lists<S: AsRef<str>>(keys: &[S]) -> bool {
    keys.iter().any(|k| ListKey::from_storage_key(k.as_ref()).is_some())
}

// =============================================================================
// Term List
// =============================================================================

/// Ordered, user-entered list of match terms.
///
/// Terms are stored exactly as entered. Trimming and lowercasing happen at
/// comparison time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TermList {
    terms: Vec<String>,
}

impl TermList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coerce a raw storage value into a term list.
    ///
    /// Non-arrays become an empty list. Inside an array, strings are kept
    /// verbatim, numbers and booleans are stringified, anything else is
    /// dropped.
    pub fn from_value(value: Option<&Value>) -> Self {
        let terms = match value {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Self { terms }
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.terms.iter().cloned().map(Value::String).collect())
    }

    /// Append a term as entered. Returns false if the input is blank after
    /// trimming or already present (exact match).
    pub fn add(&mut self, term: &str) -> bool {
        if term.trim().is_empty() || self.terms.iter().any(|t| t == term) {
            return false;
        }
        self.terms.push(term.to_string());
        true
    }

    /// Remove an exact term. Returns false if it was not present.
    pub fn remove(&mut self, term: &str) -> bool {
        let before = self.terms.len();
        self.terms.retain(|t| t != term);
        self.terms.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.terms
    }
}

impl<S: Into<String>> FromIterator<S> for TermList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// Lists
// =============================================================================

/// All four term lists as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lists {
    pub black_names: TermList,
    pub black_values: TermList,
    pub grey_names: TermList,
    pub grey_values: TermList,
}

impl Lists {
    /// Build from a storage read result. Missing or malformed keys load as
    /// empty lists.
    pub fn from_storage(data: &Map<String, Value>) -> Self {
        let load = |key: ListKey| TermList::from_value(data.get(key.storage_key()));
        Self {
            black_names: load(ListKey::BlacklistNames),
            black_values: load(ListKey::BlacklistValues),
            grey_names: load(ListKey::GreylistNames),
            grey_values: load(ListKey::GreylistValues),
        }
    }

    pub fn to_storage(&self) -> Map<String, Value> {
        ListKey::ALL
            .into_iter()
            .map(|key| (key.storage_key().to_string(), self.get(key).to_value()))
            .collect()
    }

    pub fn get(&self, key: ListKey) -> &TermList {
        match key {
            ListKey::BlacklistNames => &self.black_names,
            ListKey::BlacklistValues => &self.black_values,
            ListKey::GreylistNames => &self.grey_names,
            ListKey::GreylistValues => &self.grey_values,
        }
    }

    pub fn get_mut(&mut self, key: ListKey) -> &mut TermList {
        match key {
            ListKey::BlacklistNames => &mut self.black_names,
            ListKey::BlacklistValues => &mut self.black_values,
            ListKey::GreylistNames => &mut self.grey_names,
            ListKey::GreylistValues => &mut self.grey_values,
        }
    }

    /// `(names, values)` pair for one list kind.
    pub fn pair(&self, kind: ListKind) -> (&TermList, &TermList) {
        match kind {
            ListKind::Blacklist => (&self.black_names, &self.black_values),
            ListKind::Greylist => (&self.grey_names, &self.grey_values),
        }
    }
}
