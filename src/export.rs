//! PNG export of the colored document.

use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageError, RgbaImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::log_info;
use crate::render::{self, RenderError};

#[derive(Debug)]
pub enum ExportError {
    Render(RenderError),
    Encode(ImageError),
    Io(std::io::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Render(e) => write!(f, "render failed: {}", e),
            ExportError::Encode(e) => write!(f, "PNG encode failed: {}", e),
            ExportError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<RenderError> for ExportError {
    fn from(e: RenderError) -> Self {
        ExportError::Render(e)
    }
}

impl From<ImageError> for ExportError {
    fn from(e: ImageError) -> Self {
        ExportError::Encode(e)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

/// `<imageId>-colored.png`, with characters unsafe in file names replaced.
pub fn export_file_name(image_id: &str) -> String {
    let safe: String = image_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.trim_matches('.').is_empty() {
        "image".to_string()
    } else {
        safe
    };
    format!("{}-colored.png", safe)
}

/// Encode RGBA pixels as PNG into any writer.
pub fn write_png<W: Write>(image: &RgbaImage, writer: W) -> Result<(), ExportError> {
    let encoder = PngEncoder::new(writer);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(())
}

/// Rasterize the document onto white at its natural size and return PNG bytes.
pub fn png_bytes(doc: &Document) -> Result<Vec<u8>, ExportError> {
    let image = render::rasterize(doc)?;
    let mut bytes = Vec::new();
    write_png(&image, &mut bytes)?;
    Ok(bytes)
}

/// Write `<out_dir>/<imageId>-colored.png`.
///
/// With no document loaded nothing is written and `Ok(None)` is returned.
pub fn export_png(
    doc: Option<&Document>,
    image_id: &str,
    out_dir: &Path,
) -> Result<Option<PathBuf>, ExportError> {
    let Some(doc) = doc else {
        return Ok(None);
    };

    let image = render::rasterize(doc)?;
    if !out_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(out_dir)?;
    }
    let path = out_dir.join(export_file_name(image_id));
    let mut writer = BufWriter::new(File::create(&path)?);
    write_png(&image, &mut writer)?;
    writer.flush()?;

    log_info!(
        "Exported {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("colorbook-export-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn file_name_follows_the_image_id() {
        assert_eq!(export_file_name("fox"), "fox-colored.png");
        assert_eq!(export_file_name("../etc/x"), ".._etc_x-colored.png");
        assert_eq!(export_file_name(""), "image-colored.png");
    }

    #[test]
    fn nothing_loaded_means_nothing_written() {
        let dir = temp_dir();
        assert!(export_png(None, "fox", &dir).unwrap().is_none());
        assert!(!dir.exists());
    }

    #[test]
    fn export_writes_an_opaque_png_at_natural_size() {
        let doc = Document::parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="12">
                <rect x="0" y="0" width="12" height="12" fill="#4ECDC4"/>
            </svg>"##,
        )
        .unwrap();
        let dir = temp_dir();
        let path = export_png(Some(&doc), "fox", &dir).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "fox-colored.png");

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (24, 12));
        assert_eq!(decoded.get_pixel(4, 4).0, [0x4E, 0xCD, 0xC4, 255]);
        // Uncovered area gets the white background, not transparency
        assert_eq!(decoded.get_pixel(20, 6).0, [255, 255, 255, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
