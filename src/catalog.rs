//! Animal catalog: the list of coloring pages and their metadata.

use std::path::Path;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::{log_err, log_warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// SVG file under the image directory; defaults to `<id>.svg`.
    #[serde(default)]
    pub filename: String,
    /// Any other catalog fields (`extinct_since`, ...), kept for `--show`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Animal {
    pub fn svg_filename(&self) -> String {
        if self.filename.is_empty() {
            format!("{}.svg", self.id)
        } else {
            self.filename.clone()
        }
    }

    fn matches_search(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "catalog file could not be read: {}", e),
            CatalogError::Json(e) => write!(f, "catalog file is not valid JSON: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Json(e)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    animals: Vec<Animal>,
}

impl Catalog {
    pub fn new(animals: Vec<Animal>) -> Self {
        Self { animals }
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn try_load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Load the catalog; a missing or malformed file yields an empty catalog.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(catalog) => catalog,
            Err(CatalogError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log_err!("{} not found", path.display());
                Self::default()
            }
            Err(e) => {
                log_err!("Error decoding {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Build entries from the SVG files present in `image_dir` (used when
    /// there is no catalog file). Ids are the file stems.
    pub fn discover(image_dir: &Path) -> Self {
        let pattern = image_dir.join("*.svg");
        let Some(pattern) = pattern.to_str() else {
            return Self::default();
        };
        let mut animals = Vec::new();
        match glob::glob(pattern) {
            Ok(entries) => {
                for path in entries.flatten() {
                    let (Some(stem), Some(file)) = (
                        path.file_stem().and_then(|s| s.to_str()),
                        path.file_name().and_then(|s| s.to_str()),
                    ) else {
                        continue;
                    };
                    animals.push(Animal {
                        id: stem.to_string(),
                        name: title_case(stem),
                        category: String::new(),
                        description: String::new(),
                        filename: file.to_string(),
                        extra: serde_json::Map::new(),
                    });
                }
            }
            Err(e) => log_warn!("invalid glob '{}': {}", pattern, e),
        }
        animals.sort_by(|a, b| a.id.cmp(&b.id));
        Self::new(animals)
    }

    /// Catalog file if present, otherwise whatever SVGs sit in `image_dir`.
    pub fn load_or_discover(catalog_path: &Path, image_dir: &Path) -> Self {
        if catalog_path.exists() {
            Self::load(catalog_path)
        } else {
            log_warn!(
                "No catalog at {}, listing {} instead",
                catalog_path.display(),
                image_dir.display()
            );
            Self::discover(image_dir)
        }
    }

    pub fn all(&self) -> &[Animal] {
        &self.animals
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Animal> {
        self.animals.iter().find(|a| a.id == id)
    }

    /// Case-insensitive category match and name/description substring
    /// search. Empty arguments do not filter.
    pub fn filter(&self, category: &str, search: &str) -> Vec<&Animal> {
        let category = category.trim();
        let query = search.trim().to_lowercase();
        self.animals
            .iter()
            .filter(|a| category.is_empty() || a.category.eq_ignore_ascii_case(category))
            .filter(|a| query.is_empty() || a.matches_search(&query))
            .collect()
    }

    /// Sorted, de-duplicated category names.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .animals
            .iter()
            .filter(|a| !a.category.is_empty())
            .map(|a| a.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn random(&self) -> Option<&Animal> {
        self.animals.choose(&mut rand::rng())
    }
}

fn title_case(stem: &str) -> String {
    stem.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"id": "fox", "name": "Falkland Islands Wolf", "category": "Mammals",
         "description": "A fox-like canid.", "filename": "fox.svg", "extinct_since": "1876"},
        {"id": "dodo", "name": "Dodo", "category": "Birds",
         "description": "A flightless bird from Mauritius."},
        {"id": "moa", "name": "Giant Moa", "category": "birds",
         "description": "Very tall and flightless."}
    ]"#;

    #[test]
    fn extra_fields_are_kept_and_filename_defaults() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 3);
        let fox = catalog.find("fox").unwrap();
        assert_eq!(fox.extra.get("extinct_since"), Some(&serde_json::json!("1876")));
        let round_trip = serde_json::to_value(fox).unwrap();
        assert_eq!(round_trip["extinct_since"], "1876");
        assert!(round_trip.get("extra").is_none());
        assert_eq!(catalog.find("fox").unwrap().svg_filename(), "fox.svg");
        assert_eq!(catalog.find("dodo").unwrap().svg_filename(), "dodo.svg");
        assert!(catalog.find("quagga").is_none());
    }

    #[test]
    fn category_and_search_filters_combine() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let birds: Vec<&str> = catalog.filter("BIRDS", "").iter().map(|a| a.id.as_str()).collect();
        assert_eq!(birds, vec!["dodo", "moa"]);

        let flightless = catalog.filter("", "FLIGHTLESS");
        assert_eq!(flightless.len(), 2);

        let both = catalog.filter("birds", "mauritius");
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, "dodo");

        assert_eq!(catalog.filter("", "").len(), 3);
    }

    #[test]
    fn categories_are_sorted_and_unique() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.categories(), vec!["Birds", "Mammals", "birds"]);
    }

    #[test]
    fn random_pick_comes_from_the_catalog() {
        assert!(Catalog::default().random().is_none());
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let picked = catalog.random().unwrap();
        assert!(catalog.find(&picked.id).is_some());
    }

    #[test]
    fn missing_or_broken_file_gives_empty_catalog() {
        let missing = std::env::temp_dir().join("colorbook-missing-animals.json");
        assert!(Catalog::load(&missing).is_empty());
        assert!(matches!(Catalog::from_json("{"), Err(CatalogError::Json(_))));
    }

    #[test]
    fn discovery_uses_file_stems() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("static/images/animals");
        let catalog = Catalog::discover(&dir);
        let ids: Vec<&str> = catalog.all().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["dodo", "fox"]);
        assert_eq!(title_case("woolly_mammoth"), "Woolly Mammoth");
    }
}
