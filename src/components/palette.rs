use eframe::egui;
use egui::{Color32, Sense, Stroke, Vec2};

/// Swatch colors in display order. `#85C1E9` appears twice; both swatches
/// are kept so the grid stays 5×5.
pub const DEFAULT_COLORS: [&str; 25] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7",
    "#DDA0DD", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E9",
    "#F8C471", "#82E0AA", "#F1948A", "#85C1E9", "#D7BDE2",
    "#A3E4D7", "#FAD7A0", "#D5A6BD", "#A9DFBF", "#F9E79F",
    "#000000", "#FFFFFF", "#8B4513", "#228B22", "#FF4500",
];

const SWATCHES_PER_ROW: usize = 5;
const SWATCH_SIZE: f32 = 28.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
    pub color: String,
    pub selected: bool,
}

/// Fixed list of colors with exactly one selected entry.
#[derive(Clone, Debug)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(&DEFAULT_COLORS)
    }
}

impl Palette {
    /// Build a palette with the first color selected. An empty list falls
    /// back to the default colors.
    pub fn new(colors: &[&str]) -> Self {
        let colors: &[&str] = if colors.is_empty() { &DEFAULT_COLORS } else { colors };
        let entries = colors
            .iter()
            .enumerate()
            .map(|(i, c)| PaletteEntry {
                color: c.to_string(),
                selected: i == 0,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.entries.iter().position(|e| e.selected).unwrap_or(0)
    }

    /// Color used by the next recolor action.
    pub fn current_color(&self) -> &str {
        self.entries
            .get(self.selected_index())
            .map(|e| e.color.as_str())
            .unwrap_or(DEFAULT_COLORS[0])
    }

    /// Select the entry at `index`, deselecting the previous one.
    /// Returns `false` (and changes nothing) when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.selected = i == index;
        }
        true
    }

    /// Draw the swatch grid. Returns the index clicked this frame.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<usize> {
        let mut clicked = None;
        let active_stroke = Stroke::new(3.0, ui.visuals().strong_text_color());
        let idle_stroke = Stroke::new(1.0, Color32::from_gray(120));

        for (row_index, row) in self.entries.chunks(SWATCHES_PER_ROW).enumerate() {
            ui.horizontal(|ui| {
                for (col, entry) in row.iter().enumerate() {
                    let index = row_index * SWATCHES_PER_ROW + col;
                    let (rect, response) =
                        ui.allocate_exact_size(Vec2::splat(SWATCH_SIZE), Sense::click());
                    let fill = color32_from_hex(&entry.color).unwrap_or(Color32::WHITE);
                    let painter = ui.painter();
                    painter.rect_filled(rect, 4.0, fill);
                    let stroke = if entry.selected { active_stroke } else { idle_stroke };
                    painter.rect_stroke(rect, 4.0, stroke);
                    if response.clicked() {
                        clicked = Some(index);
                    }
                    response.on_hover_text(entry.color.as_str());
                }
            });
        }

        if let Some(index) = clicked {
            self.select(index);
        }
        clicked
    }
}

/// Parse `#RGB` or `#RRGGBB`.
pub fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?]),
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        _ => None,
    }
}

pub fn color32_from_hex(color: &str) -> Option<Color32> {
    let [r, g, b] = parse_hex(color)?;
    Some(Color32::from_rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_keeps_all_25_swatches() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 25);
        assert_eq!(palette.selected_index(), 0);
        assert_eq!(palette.current_color(), "#FF6B6B");
        let dupes = palette
            .entries()
            .iter()
            .filter(|e| e.color == "#85C1E9")
            .count();
        assert_eq!(dupes, 2);
    }

    #[test]
    fn selecting_moves_the_single_selection() {
        let mut palette = Palette::default();
        assert!(palette.select(1));
        assert_eq!(palette.current_color(), "#4ECDC4");
        assert_eq!(palette.entries().iter().filter(|e| e.selected).count(), 1);
        assert!(!palette.entries()[0].selected);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut palette = Palette::default();
        palette.select(3);
        assert!(!palette.select(25));
        assert_eq!(palette.selected_index(), 3);
    }

    #[test]
    fn empty_color_list_uses_defaults() {
        assert_eq!(Palette::new(&[]).len(), DEFAULT_COLORS.len());
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex("#4ECDC4"), Some([0x4E, 0xCD, 0xC4]));
        assert_eq!(parse_hex("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_hex("white"), None);
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#GG0000"), None);
    }
}
