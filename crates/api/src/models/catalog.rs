use super::locator::Locator;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One position of the catalog: a single model or an ordered series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Single(Locator),
    Group(Vec<Locator>),
}

impl CatalogEntry {
    /// Build an entry from collected locators: none yields `None`, one yields a
    /// single entry, more yield a group in the given order.
    pub fn from_locators(mut locators: Vec<Locator>) -> Option<Self> {
        match locators.len() {
            0 => None,
            1 => locators.pop().map(CatalogEntry::Single),
            _ => Some(CatalogEntry::Group(locators)),
        }
    }

    /// Number of ids this entry consumes.
    pub fn len(&self) -> usize {
        match self {
            CatalogEntry::Single(_) => 1,
            CatalogEntry::Group(members) => members.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn locators(&self) -> &[Locator] {
        match self {
            CatalogEntry::Single(locator) => std::slice::from_ref(locator),
            CatalogEntry::Group(members) => members,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, CatalogEntry::Group(_))
    }
}

/// Persisted, ordered model catalog.
///
/// The position of every locator in [`Catalog::flatten`] is its public integer id,
/// so entry order is part of the addressing contract. `messages[i]` describes
/// `models[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub models: Vec<CatalogEntry>,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CatalogEntry, message: impl Into<String>) {
        self.models.push(entry);
        self.messages.push(message.into());
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (CatalogEntry, String)>) {
        for (entry, message) in entries {
            self.push(entry, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Total number of addressable ids.
    pub fn model_count(&self) -> usize {
        self.models.iter().map(CatalogEntry::len).sum()
    }

    /// Resolve an id to its locator by walking entries in stored order.
    pub fn resolve(&self, id: usize) -> Option<&Locator> {
        self.locate(id).map(|(_, locator)| locator)
    }

    /// Like [`Catalog::resolve`] but also returns the index of the owning entry.
    pub fn locate(&self, id: usize) -> Option<(usize, &Locator)> {
        let mut first_id = 0;
        for (index, entry) in self.models.iter().enumerate() {
            let len = entry.len();
            if id < first_id + len {
                return entry.locators().get(id - first_id).map(|l| (index, l));
            }
            first_id += len;
        }
        None
    }

    /// All locators in id order, groups spliced inline.
    pub fn flatten(&self) -> Vec<&Locator> {
        self.models
            .iter()
            .flat_map(|entry| entry.locators().iter())
            .collect()
    }

    /// Message of the entry owning `id`.
    pub fn message_for(&self, id: usize) -> Option<&str> {
        let (index, _) = self.locate(id)?;
        self.messages.get(index).map(String::as_str)
    }
}

/// Public model id as sent by clients: `"3"` or `"3-1"` (model, texture variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId {
    pub model: usize,
    pub texture: usize,
}

impl ModelId {
    pub fn new(model: usize) -> Self {
        Self { model, texture: 0 }
    }
}

impl FromStr for ModelId {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, '-');
        let model = parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .ok_or_else(|| ApiError::InvalidArgument(format!("invalid model id: {s}")))?;
        let texture = match parts.next() {
            Some(p) if !p.is_empty() => p
                .parse::<usize>()
                .map_err(|_| ApiError::InvalidArgument(format!("invalid texture id: {s}")))?,
            _ => 0,
        };
        Ok(Self { model, texture })
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.texture == 0 {
            write!(f, "{}", self.model)
        } else {
            write!(f, "{}-{}", self.model, self.texture)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.push(
            CatalogEntry::Group(vec![Locator::local("A/x"), Locator::local("A/y")]),
            "A series",
        );
        catalog.push(CatalogEntry::Single(Locator::local("B")), "model from B");
        catalog.push(
            CatalogEntry::Group(vec![
                Locator::remote("https://h/1"),
                Locator::remote("https://h/2"),
                Locator::remote("https://h/3"),
            ]),
            "models from C",
        );
        catalog
    }

    #[test]
    fn test_flatten_length_matches_id_space() {
        let catalog = sample();
        let flat = catalog.flatten();
        assert_eq!(flat.len(), 2 + 1 + 3);
        assert_eq!(flat.len(), catalog.model_count());
        for id in 0..flat.len() {
            assert_eq!(catalog.resolve(id), Some(flat[id]));
        }
        assert!(catalog.resolve(flat.len()).is_none());
        assert!(catalog.resolve(usize::MAX).is_none());
    }

    #[test]
    fn test_group_consumes_consecutive_ids() {
        let catalog = sample();
        assert_eq!(catalog.resolve(0), Some(&Locator::local("A/x")));
        assert_eq!(catalog.resolve(1), Some(&Locator::local("A/y")));
        assert_eq!(catalog.resolve(2), Some(&Locator::local("B")));
        assert_eq!(catalog.resolve(5), Some(&Locator::remote("https://h/3")));
        assert_eq!(catalog.message_for(4), Some("models from C"));
        assert_eq!(catalog.message_for(2), Some("model from B"));
    }

    #[test]
    fn test_persisted_shape() {
        let catalog = sample();
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(
            json["models"],
            serde_json::json!([["A/x", "A/y"], "B", ["https://h/1", "https://h/2", "https://h/3"]])
        );
        let back: Catalog = serde_json::from_value(json).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn test_from_locators() {
        assert!(CatalogEntry::from_locators(vec![]).is_none());
        assert_eq!(
            CatalogEntry::from_locators(vec![Locator::local("a")]),
            Some(CatalogEntry::Single(Locator::local("a")))
        );
        assert!(
            CatalogEntry::from_locators(vec![Locator::local("a"), Locator::local("b")])
                .unwrap()
                .is_group()
        );
    }

    #[test]
    fn test_model_id_parsing() {
        assert_eq!("7".parse::<ModelId>().unwrap(), ModelId::new(7));
        assert_eq!(
            "7-2".parse::<ModelId>().unwrap(),
            ModelId { model: 7, texture: 2 }
        );
        assert_eq!("7-".parse::<ModelId>().unwrap(), ModelId::new(7));
        assert!("x".parse::<ModelId>().is_err());
        assert!("7-x".parse::<ModelId>().is_err());
        assert_eq!(ModelId { model: 3, texture: 1 }.to_string(), "3-1");
    }
}
