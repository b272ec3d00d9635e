use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::binder::{Bindings, HoverChange, BLANK_FILL, HOVER_OPACITY};
use crate::components::history::{HistoryManager, DEFAULT_MAX_HISTORY};
use crate::components::palette::Palette;
use crate::document::{Document, ShapeId};
use crate::export::{self, ExportError};
use crate::loader::{ImageLoader, LoadError, LOAD_ERROR_MESSAGE};
use crate::progress::{Progress, ProgressTracker, ProgressUpdate};
use crate::render::{self, RenderError};
use crate::{log_err, log_info};

/// What the image container currently holds.
#[derive(Clone, Debug, Default)]
pub enum Container {
    #[default]
    Empty,
    Document(Document),
    /// Fixed user-facing message after a failed load.
    Error(&'static str),
}

/// One coloring session: the open image plus palette, history and progress.
pub struct ColoringProject {
    pub image_id: String,
    pub filename: String,
    container: Container,
    pub palette: Palette,
    pub history: HistoryManager,
    bindings: Bindings,
    tracker: ProgressTracker,
    hover_opacity: f32,
    /// Bumped on every change to what the canvas shows.
    revision: u64,
}

impl ColoringProject {
    pub fn new(tracker: ProgressTracker) -> Self {
        Self::with_history_limit(tracker, DEFAULT_MAX_HISTORY)
    }

    pub fn with_history_limit(tracker: ProgressTracker, max_history: usize) -> Self {
        Self {
            image_id: String::new(),
            filename: String::new(),
            container: Container::Empty,
            palette: Palette::default(),
            history: HistoryManager::new(max_history),
            bindings: Bindings::default(),
            tracker,
            hover_opacity: HOVER_OPACITY,
            revision: 0,
        }
    }

    pub fn set_hover_opacity(&mut self, opacity: f32) {
        self.hover_opacity = opacity.clamp(0.0, 1.0);
        self.revision += 1;
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.container {
            Container::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self.container {
            Container::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Load `filename` as image `image_id`, bind it and start a fresh history.
    /// On failure the container shows the load error and history is emptied.
    pub fn load(
        &mut self,
        loader: &ImageLoader,
        image_id: &str,
        filename: &str,
    ) -> Result<(), LoadError> {
        self.image_id = image_id.to_string();
        self.filename = filename.to_string();
        self.revision += 1;

        match loader.load(filename) {
            Ok(mut doc) => {
                self.bindings = Bindings::bind(&mut doc);
                self.history.initialize(format!("Open {}", image_id));
                self.container = Container::Document(doc);
                Ok(())
            }
            Err(e) => {
                self.bindings = Bindings::default();
                self.history.clear();
                self.container = Container::Error(LOAD_ERROR_MESSAGE);
                Err(e)
            }
        }
    }

    // ========================================================================
    // EDITING
    // ========================================================================

    /// Select a palette entry. Out-of-range indices are ignored.
    pub fn select_color(&mut self, index: usize) -> bool {
        self.palette.select(index)
    }

    /// Recolor one shape with the selected palette color. Returns `None`
    /// (and records nothing) when no document is loaded or the id is unknown.
    pub fn color_shape(&mut self, id: ShapeId) -> Option<ProgressUpdate> {
        let color = self.palette.current_color().to_string();
        self.color_shape_with(id, &color)
    }

    /// Recolor one shape with an explicit color, bypassing the palette.
    pub fn color_shape_with(&mut self, id: ShapeId, color: &str) -> Option<ProgressUpdate> {
        let Container::Document(doc) = &mut self.container else {
            return None;
        };
        let before = doc.to_markup();
        if !doc.set_fill(id, color) {
            return None;
        }
        self.history
            .record(before, format!("Color shape {} {}", id.0 + 1, color));
        self.revision += 1;
        Some(self.tracker.evaluate(&self.image_id, doc))
    }

    /// Recolor whatever shape sits under an image-space point.
    pub fn click_at(&mut self, x: f32, y: f32) -> Option<ProgressUpdate> {
        let id = self.bindings.hit_test(x, y)?;
        self.color_shape(id)
    }

    /// Reset every shape to the blank fill as one undoable step.
    pub fn clear_all(&mut self) -> Option<ProgressUpdate> {
        let Container::Document(doc) = &mut self.container else {
            return None;
        };
        let before = doc.to_markup();
        let ids: Vec<ShapeId> = doc.shape_ids().collect();
        for id in ids {
            doc.set_fill(id, BLANK_FILL);
        }
        self.bindings = Bindings::bind(doc);
        self.history.record(before, "Clear all");
        self.revision += 1;
        Some(self.tracker.evaluate(&self.image_id, doc))
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        let Some(current) = self.document().map(Document::to_markup) else {
            return false;
        };
        match self.history.undo(current) {
            Some(markup) => self.restore(&markup),
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let Some(current) = self.document().map(Document::to_markup) else {
            return false;
        };
        match self.history.redo(current) {
            Some(markup) => self.restore(&markup),
            None => false,
        }
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        let Some(current) = self.document().map(Document::to_markup) else {
            return false;
        };
        match self.history.jump_to(index, current) {
            Some(markup) => self.restore(&markup),
            None => false,
        }
    }

    pub fn undo_enabled(&self) -> bool {
        self.document().is_some() && self.history.can_undo()
    }

    pub fn redo_enabled(&self) -> bool {
        self.document().is_some() && self.history.can_redo()
    }

    /// Replace the document with a snapshot and rebind it.
    fn restore(&mut self, markup: &str) -> bool {
        match Document::parse(markup) {
            Ok(mut doc) => {
                self.bindings = Bindings::bind(&mut doc);
                self.container = Container::Document(doc);
                self.revision += 1;
                true
            }
            Err(e) => {
                log_err!("Could not restore history step {}: {}", self.history.index(), e);
                false
            }
        }
    }

    // ========================================================================
    // POINTER
    // ========================================================================

    pub fn pointer_moved(&mut self, pos: Option<(f32, f32)>) -> Option<HoverChange> {
        let change = self.bindings.pointer_moved(pos);
        if change.is_some() {
            self.revision += 1;
        }
        change
    }

    pub fn hovered(&self) -> Option<ShapeId> {
        self.bindings.hovered()
    }

    pub fn hit_test(&self, x: f32, y: f32) -> Option<ShapeId> {
        self.bindings.hit_test(x, y)
    }

    // ========================================================================
    // OUTPUT
    // ========================================================================

    pub fn progress(&self) -> Option<Progress> {
        self.document().map(Progress::measure)
    }

    pub fn is_completed(&self) -> bool {
        !self.image_id.is_empty() && self.tracker.is_completed(&self.image_id)
    }

    pub fn completed_ids(&self) -> Vec<String> {
        self.tracker.completed()
    }

    /// Pixels for the canvas, with the hovered shape dimmed.
    pub fn render_view(&self) -> Option<Result<RgbaImage, RenderError>> {
        let doc = self.document()?;
        Some(render::rasterize_with_hover(
            doc,
            self.bindings.hovered(),
            self.hover_opacity,
        ))
    }

    pub fn export(&self, out_dir: &Path) -> Result<Option<PathBuf>, ExportError> {
        let result = export::export_png(self.document(), &self.image_id, out_dir);
        if let Ok(None) = result {
            log_info!("Export skipped: no image loaded");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ART: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="10">
  <rect x="0" y="0" width="10" height="10"/>
  <rect x="10" y="0" width="10" height="10" fill="none"/>
  <rect x="20" y="0" width="10" height="10" fill="#FFFFFF"/>
</svg>"##;

    fn project_with_art() -> (ColoringProject, PathBuf) {
        let root = std::env::temp_dir().join(format!("colorbook-project-{}", uuid::Uuid::new_v4()));
        let dir = root.join("images/animals");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("art.svg"), ART).unwrap();
        let mut project = ColoringProject::new(ProgressTracker::in_memory());
        project.load(&ImageLoader::new(&root), "art", "art.svg").unwrap();
        (project, root)
    }

    #[test]
    fn fresh_project_is_empty_and_inert() {
        let mut project = ColoringProject::new(ProgressTracker::in_memory());
        assert!(matches!(project.container(), Container::Empty));
        assert!(project.color_shape(ShapeId(0)).is_none());
        assert!(project.clear_all().is_none());
        assert!(!project.undo());
        assert!(!project.undo_enabled());
        assert!(project.render_view().is_none());
    }

    #[test]
    fn failed_load_shows_the_fixed_message() {
        let mut project = ColoringProject::new(ProgressTracker::in_memory());
        let loader = ImageLoader::new(std::env::temp_dir().join("colorbook-empty-root"));
        assert!(project.load(&loader, "ghost", "ghost.svg").is_err());
        assert_eq!(project.error_message(), Some(LOAD_ERROR_MESSAGE));
        assert!(project.history.is_empty());
    }

    #[test]
    fn recolor_records_the_state_before_the_change() {
        let (mut project, root) = project_with_art();
        let blank = project.document().unwrap().to_markup();
        assert_eq!(project.history.len(), 1);
        project.select_color(1);
        let update = project.click_at(5.0, 5.0).unwrap();
        assert_eq!(update.progress.colored, 1);
        assert_eq!(project.history.len(), 2);
        assert_eq!(project.history.snapshot_count(), 1);
        let colored = project.document().unwrap().to_markup();

        assert!(project.undo());
        assert_eq!(project.document().unwrap().to_markup(), blank);
        assert!(project.redo());
        assert_eq!(project.document().unwrap().to_markup(), colored);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn clicking_outside_every_shape_does_nothing() {
        let (mut project, root) = project_with_art();
        assert!(project.click_at(100.0, 100.0).is_none());
        assert!(project.color_shape(ShapeId(9)).is_none());
        assert_eq!(project.history.len(), 1);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn clear_all_is_one_undoable_step() {
        let (mut project, root) = project_with_art();
        project.color_shape(ShapeId(0));
        project.color_shape(ShapeId(1));
        let update = project.clear_all().unwrap();
        assert_eq!(update.progress.colored, 0);
        assert_eq!(project.history.len(), 4);

        assert!(project.undo());
        assert_eq!(project.progress().unwrap().colored, 2);
        assert_eq!(project.history.redo_description(), Some("Clear all"));
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn completion_follows_recolors() {
        let (mut project, root) = project_with_art();
        project.color_shape(ShapeId(0));
        assert!(!project.is_completed());
        let update = project.color_shape(ShapeId(2)).unwrap();
        assert!(update.newly_completed);
        assert!(project.is_completed());
        assert_eq!(project.completed_ids(), vec!["art".to_string()]);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn hover_dims_the_view_only() {
        let (mut project, root) = project_with_art();
        let before = project.document().unwrap().to_markup();
        assert_eq!(
            project.pointer_moved(Some((15.0, 5.0))),
            Some(HoverChange::Enter(ShapeId(1)))
        );
        let view = project.render_view().unwrap().unwrap();
        assert_eq!(view.dimensions(), (30, 10));
        assert_eq!(project.document().unwrap().to_markup(), before);
        assert_eq!(project.history.snapshot_count(), 0);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn hover_uses_the_configured_opacity() {
        let (mut project, root) = project_with_art();
        // #000000
        project.select_color(20);
        project.color_shape(ShapeId(0));
        project.pointer_moved(Some((5.0, 5.0)));

        let dimmed = project.render_view().unwrap().unwrap();
        assert!(dimmed.get_pixel(5, 5).0[0] > 0);
        assert!(dimmed.get_pixel(5, 5).0[0] < 255);

        project.set_hover_opacity(0.0);
        let hidden = project.render_view().unwrap().unwrap();
        assert_eq!(hidden.get_pixel(5, 5).0, [255, 255, 255, 255]);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn undo_rebinds_so_shapes_stay_clickable() {
        let (mut project, root) = project_with_art();
        project.color_shape(ShapeId(0));
        assert!(project.undo());
        assert_eq!(project.hit_test(25.0, 5.0), Some(ShapeId(2)));
        assert!(project.click_at(25.0, 5.0).is_some());
        assert!(!project.redo_enabled());
        let _ = std::fs::remove_dir_all(root);
    }
}
