use std::path::{Path, PathBuf};

use colorbook::components::history::HistoryState;
use colorbook::document::ShapeId;
use colorbook::loader::ImageLoader;
use colorbook::progress::{JsonFileStore, MemoryProgressStore, ProgressTracker};
use colorbook::project::ColoringProject;

fn assets() -> ImageLoader {
    ImageLoader::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("static"))
}

fn fox() -> ColoringProject {
    let mut project = ColoringProject::new(ProgressTracker::new(Box::new(
        MemoryProgressStore::default(),
    )));
    project.load(&assets(), "fox", "fox.svg").unwrap();
    project
}

fn fill_of(project: &ColoringProject, index: usize) -> String {
    project
        .document()
        .and_then(|d| d.fill(ShapeId(index)))
        .unwrap_or_default()
        .to_string()
}

#[test]
fn fox_recolor_undo_redo() {
    let mut project = fox();
    assert_eq!(project.document().unwrap().shape_count(), 4);
    assert_eq!(project.history.state(), HistoryState::AtEarliest);

    // #4ECDC4 is the second palette swatch
    assert!(project.select_color(1));
    project.color_shape(ShapeId(0)).unwrap();
    assert_eq!(project.history.len(), 2);
    assert_eq!(project.history.index(), 1);

    assert!(project.undo());
    assert_eq!(fill_of(&project, 0), "white");
    assert_eq!(project.history.index(), 0);
    assert!(!project.undo_enabled());
    assert!(project.redo_enabled());

    assert!(project.redo());
    assert_eq!(fill_of(&project, 0), "#4ECDC4");
    assert_eq!(project.history.index(), 1);
    assert!(!project.redo_enabled());
}

#[test]
fn undoing_every_recolor_returns_to_blank() {
    let mut project = fox();
    let blank = project.document().unwrap().to_markup();
    let edits = [(0, 3), (1, 5), (2, 0), (3, 24), (0, 20), (1, 1)];
    for &(shape, color) in &edits {
        project.select_color(color);
        project.color_shape(ShapeId(shape)).unwrap();
    }

    for _ in 0..edits.len() {
        assert!(project.undo_enabled());
        assert!(project.undo());
    }
    assert!(!project.undo_enabled());
    assert!(!project.undo());
    assert_eq!(project.document().unwrap().to_markup(), blank);
}

#[test]
fn new_action_after_undo_discards_redo() {
    let mut project = fox();
    project.color_shape(ShapeId(0));
    project.color_shape(ShapeId(1));
    project.undo();
    assert!(project.redo_enabled());

    project.color_shape(ShapeId(2));
    assert!(!project.redo_enabled());
    assert!(!project.redo());
    assert_eq!(project.history.len(), 3);
    // The undone recolor is gone for good
    assert_eq!(fill_of(&project, 1), "white");
}

#[test]
fn twenty_recolors_undo_back_to_blank() {
    let mut project = fox();
    let blank = project.document().unwrap().to_markup();
    for i in 0..20 {
        project.select_color(i % 25);
        project.color_shape(ShapeId(i % 4)).unwrap();
        assert!(project.history.snapshot_count() <= 20);
    }

    for _ in 0..20 {
        assert!(project.undo_enabled());
        assert!(project.undo());
    }
    assert!(!project.undo_enabled());
    assert_eq!(project.history.index(), 0);
    assert_eq!(project.document().unwrap().to_markup(), blank);
    assert_eq!(project.progress().unwrap().colored, 0);
}

#[test]
fn history_is_bounded_and_evicts_oldest() {
    let mut project = fox();
    for i in 0..30 {
        project.select_color(i % 25);
        project.color_shape(ShapeId(i % 4));
        assert!(project.history.snapshot_count() <= 20);
    }
    assert_eq!(project.history.snapshot_count(), 20);
    assert_eq!(project.history.index(), 20);
    let descriptions = project.history.descriptions();
    assert!(!descriptions.contains(&"Open fox"));
    assert!(descriptions[20].starts_with("Color shape 2"));

    let mut steps = 0;
    while project.undo() {
        steps += 1;
    }
    assert_eq!(steps, 20);
    // Ten recolors were evicted, so the earliest state is not blank
    assert!(project.progress().unwrap().colored > 0);
}

#[test]
fn shapes_stay_clickable_after_clear_and_undo() {
    let mut project = fox();
    // Head polygon
    let (x, y) = (60.0, 75.0);
    assert_eq!(project.hit_test(x, y), Some(ShapeId(1)));
    project.click_at(x, y).unwrap();
    project.clear_all().unwrap();
    assert_eq!(project.hit_test(x, y), Some(ShapeId(1)));
    project.undo();
    assert_eq!(project.hit_test(x, y), Some(ShapeId(1)));
    assert!(project.click_at(x, y).is_some());
}

#[test]
fn completion_persists_in_the_file_store() {
    let path: PathBuf = std::env::temp_dir()
        .join(format!("colorbook-flow-{}", uuid::Uuid::new_v4()))
        .join("progress.json");
    {
        let tracker = ProgressTracker::new(Box::new(JsonFileStore::new(&path)));
        let mut project = ColoringProject::new(tracker);
        project.load(&assets(), "fox", "fox.svg").unwrap();
        project.color_shape(ShapeId(0));
        let second = project.color_shape(ShapeId(1)).unwrap();
        assert!(!second.newly_completed);
        let third = project.color_shape(ShapeId(2)).unwrap();
        assert!(third.newly_completed);
        project.clear_all();
        assert!(project.is_completed());
    }

    let reopened = ProgressTracker::new(Box::new(JsonFileStore::new(&path)));
    assert_eq!(reopened.completed(), vec!["fox".to_string()]);
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn export_without_document_writes_nothing() {
    let project = ColoringProject::new(ProgressTracker::in_memory());
    let dir = std::env::temp_dir().join(format!("colorbook-flow-{}", uuid::Uuid::new_v4()));
    assert!(project.export(&dir).unwrap().is_none());
    assert!(!dir.exists());
}

#[test]
fn export_after_coloring_writes_the_png() {
    let mut project = fox();
    project.color_shape(ShapeId(1));
    let dir = std::env::temp_dir().join(format!("colorbook-flow-{}", uuid::Uuid::new_v4()));
    let path = project.export(&dir).unwrap().unwrap();
    assert_eq!(path, dir.join("fox-colored.png"));
    let png = image::open(&path).unwrap().to_rgba8();
    assert_eq!(png.dimensions(), (200, 160));
    let _ = std::fs::remove_dir_all(&dir);
}
