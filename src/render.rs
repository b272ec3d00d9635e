//! Rasterization of documents via resvg.
//!
//! Used for three things: the on-screen image (with hover highlight), the
//! exported PNG, and the pick buffer that maps pixels back to shapes.

use image::RgbaImage;
use resvg::{tiny_skia, usvg};

use crate::document::{Document, Element, ShapeId};

/// Attributes that change how a pixel is composited; stripped from the pick
/// document so every shape lands in the buffer with its exact id color.
const PICK_STRIPPED_ATTRS: &[&str] = &[
    "style",
    "opacity",
    "fill-opacity",
    "stroke-opacity",
    "filter",
    "mask",
];

/// Drawing elements that are not colorable and must not occlude shapes.
const PICK_HIDDEN_TAGS: &[&str] = &["text", "line", "polyline", "image"];

#[derive(Debug)]
pub enum RenderError {
    Svg(usvg::Error),
    /// resvg produced a zero-sized canvas.
    EmptyCanvas,
    PixelBuffer,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Svg(e) => write!(f, "SVG error: {}", e),
            RenderError::EmptyCanvas => write!(f, "image has no drawable area"),
            RenderError::PixelBuffer => write!(f, "pixel buffer size mismatch"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<usvg::Error> for RenderError {
    fn from(e: usvg::Error) -> Self {
        RenderError::Svg(e)
    }
}

/// Render the document at its natural size on a white background.
pub fn rasterize(doc: &Document) -> Result<RgbaImage, RenderError> {
    rasterize_markup(&doc.to_markup(), Some(tiny_skia::Color::WHITE))
}

/// Same as [`rasterize`] but draws `hovered` at reduced opacity.
/// The document itself is left untouched.
pub fn rasterize_with_hover(
    doc: &Document,
    hovered: Option<ShapeId>,
    opacity: f32,
) -> Result<RgbaImage, RenderError> {
    let Some(id) = hovered else {
        return rasterize(doc);
    };
    let mut view = doc.clone();
    if let Some(shape) = view.shape_mut(id) {
        shape.set_attr("opacity", format!("{}", opacity.clamp(0.0, 1.0)));
    }
    rasterize(&view)
}

/// Render markup text. `background` of `None` leaves the canvas transparent
/// and the pixels premultiplied, which only the pick buffer relies on.
fn rasterize_markup(
    markup: &str,
    background: Option<tiny_skia::Color>,
) -> Result<RgbaImage, RenderError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(markup, &options)?;
    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(RenderError::EmptyCanvas)?;
    if let Some(color) = background {
        pixmap.fill(color);
    }
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    // Opaque background: every pixel has alpha 255, so premultiplied equals
    // straight RGBA. Without one, only fully opaque pick pixels are read.
    RgbaImage::from_raw(width, height, pixmap.take()).ok_or(RenderError::PixelBuffer)
}

// ============================================================================
// PICK BUFFER
// ============================================================================

/// Per-pixel shape lookup built by rendering each shape in a unique color
/// with antialiasing disabled.
#[derive(Clone, Debug)]
pub struct PickBuffer {
    width: u32,
    height: u32,
    ids: Vec<Option<ShapeId>>,
}

impl PickBuffer {
    pub fn build(doc: &Document) -> Result<Self, RenderError> {
        let mut pick = doc.clone();
        pick.root_mut().walk_mut(&mut |el: &mut Element| {
            for name in PICK_STRIPPED_ATTRS {
                el.remove_attr(name);
            }
            // Emptied rather than removed: shape paths are child indices
            if el.local_name() == "style" {
                el.children.clear();
            }
            if PICK_HIDDEN_TAGS.contains(&el.local_name()) {
                el.set_attr("display", "none");
            }
        });
        pick.root_mut().set_attr("shape-rendering", "crispEdges");

        let count = pick.shape_count();
        for index in 0..count {
            if let Some(shape) = pick.shape_mut(ShapeId(index)) {
                let code = encode_id(index);
                shape.set_attr("fill", code.as_str());
                shape.set_attr("stroke", code.as_str());
                shape.set_attr("shape-rendering", "crispEdges");
            }
        }

        let image = rasterize_markup(&pick.to_markup(), None)?;
        let ids = image
            .pixels()
            .map(|p| decode_id(p.0, count))
            .collect();
        Ok(Self {
            width: image.width(),
            height: image.height(),
            ids,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Shape under the image-space point, if any.
    pub fn shape_at(&self, x: f32, y: f32) -> Option<ShapeId> {
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let (px, py) = (x as u32, y as u32);
        if px >= self.width || py >= self.height {
            return None;
        }
        self.ids
            .get((py as usize) * (self.width as usize) + px as usize)
            .copied()
            .flatten()
    }
}

fn encode_id(index: usize) -> String {
    format!("#{:06X}", (index + 1) & 0xFF_FFFF)
}

fn decode_id(rgba: [u8; 4], count: usize) -> Option<ShapeId> {
    if rgba[3] != 255 {
        return None;
    }
    let code = ((rgba[0] as usize) << 16) | ((rgba[1] as usize) << 8) | rgba[2] as usize;
    if code == 0 || code > count {
        return None;
    }
    Some(ShapeId(code - 1))
}
