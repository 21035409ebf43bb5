use camino::Utf8Path;
use serde::Deserialize;

use crate::error::ShelfError;

const BUNDLED_COVERS: &str = include_str!("../data/covers.json");

/// One entry of the local cover-art dataset. `name` is matched against a
/// book title by exact string equality, with no case or whitespace
/// normalization: a title differing by punctuation counts as unmatched.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplementEntry {
    pub name: String,
    pub image: String,
}

/// Static title → cover mapping, built once at startup. Lookups are pure:
/// no I/O, no failure mode.
#[derive(Debug, Clone)]
pub struct SupplementIndex {
    entries: Vec<SupplementEntry>,
}

impl SupplementIndex {
    /// The cover index compiled into the binary.
    pub fn bundled() -> Result<Self, ShelfError> {
        Self::parse(BUNDLED_COVERS)
    }

    /// A cover index read from a configured override file. The single read
    /// happens here, at initialization.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ShelfError> {
        let content = std::fs::read_to_string(path.as_std_path())
            .map_err(|_| ShelfError::SupplementRead(path.to_owned()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ShelfError> {
        let entries: Vec<SupplementEntry> = serde_json::from_str(content)
            .map_err(|err| ShelfError::SupplementParse(err.to_string()))?;
        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// First entry whose name equals `title` exactly. Titles are not
    /// guaranteed unique in the dataset; first match wins.
    pub fn lookup(&self, title: &str) -> Option<&SupplementEntry> {
        self.entries.iter().find(|entry| entry.name == title)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_index_parses() {
        let index = SupplementIndex::bundled().unwrap();
        assert!(!index.is_empty());
        assert!(index.lookup("The Shining").is_some());
    }

    #[test]
    fn lookup_is_exact_first_match() {
        let index = SupplementIndex::parse(
            r#"[
                {"name": "It", "image": "covers/it-first.jpg"},
                {"name": "It", "image": "covers/it-second.jpg"}
            ]"#,
        )
        .unwrap();
        assert_eq!(index.lookup("It").unwrap().image, "covers/it-first.jpg");
    }

    #[test]
    fn lookup_does_not_normalize() {
        let index =
            SupplementIndex::parse(r#"[{"name": "The Shining", "image": "covers/x.jpg"}]"#)
                .unwrap();
        assert!(index.lookup("the shining").is_none());
        assert!(index.lookup("The Shining ").is_none());
    }
}
