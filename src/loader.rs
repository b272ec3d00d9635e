//! Reads coloring images from the static asset tree.

use std::path::{Path, PathBuf};

use crate::document::{Document, ParseError};
use crate::{log_err, log_info};

/// The only load failure the user ever sees.
pub const LOAD_ERROR_MESSAGE: &str = "Error loading coloring image";

/// Sub-directory of the asset root holding the line art.
pub const IMAGE_SUBDIR: &str = "images/animals";

#[derive(Debug)]
pub enum LoadError {
    /// Filename was empty or tried to leave the image directory.
    InvalidName(String),
    Io(std::io::Error),
    Parse(ParseError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::InvalidName(name) => write!(f, "invalid image name '{}'", name),
            LoadError::Io(e) => write!(f, "I/O error: {}", e),
            LoadError::Parse(e) => write!(f, "parse error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<ParseError> for LoadError {
    fn from(e: ParseError) -> Self {
        LoadError::Parse(e)
    }
}

#[derive(Clone, Debug)]
pub struct ImageLoader {
    asset_root: PathBuf,
}

impl ImageLoader {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// `<asset_root>/images/animals/<filename>`
    pub fn resource_path(&self, filename: &str) -> Result<PathBuf, LoadError> {
        let plain = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\'])
            && !filename.contains("..");
        if !plain {
            return Err(LoadError::InvalidName(filename.to_string()));
        }
        Ok(self.asset_root.join(IMAGE_SUBDIR).join(filename))
    }

    /// Read and parse one image. No retry; failures are logged here and the
    /// caller decides what to show.
    pub fn load(&self, filename: &str) -> Result<Document, LoadError> {
        let result = self
            .resource_path(filename)
            .and_then(|path| {
                let text = std::fs::read_to_string(&path)?;
                Ok((path, Document::parse(&text)?))
            });
        match result {
            Ok((path, doc)) => {
                log_info!(
                    "Loaded {} ({} shapes)",
                    path.display(),
                    doc.shape_count()
                );
                Ok(doc)
            }
            Err(e) => {
                log_err!("Error loading SVG '{}': {}", filename, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_path_is_templated_from_the_filename() {
        let loader = ImageLoader::new("static");
        assert_eq!(
            loader.resource_path("fox.svg").unwrap(),
            Path::new("static").join("images/animals").join("fox.svg")
        );
    }

    #[test]
    fn traversal_names_are_rejected() {
        let loader = ImageLoader::new("static");
        for name in ["", "..", "../secret.svg", "a/b.svg", "a\\b.svg"] {
            assert!(
                matches!(loader.resource_path(name), Err(LoadError::InvalidName(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let loader = ImageLoader::new(std::env::temp_dir().join("colorbook-no-such-root"));
        assert!(matches!(loader.load("ghost.svg"), Err(LoadError::Io(_))));
    }

    #[test]
    fn bundled_sample_loads() {
        let loader = ImageLoader::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("static"));
        let doc = loader.load("fox.svg").unwrap();
        assert_eq!(doc.shape_count(), 4);
    }
}
