use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, Sense, TextureOptions, Vec2};
use std::path::PathBuf;

use colorbook::catalog::Catalog;
use colorbook::components::dialogs::{ConfirmClearDialog, Toasts};
use colorbook::components::gallery::{GalleryAction, GalleryPanel};
use colorbook::components::history::HistoryPanel;
use colorbook::loader::{ImageLoader, IMAGE_SUBDIR, LOAD_ERROR_MESSAGE};
use colorbook::progress::{JsonFileStore, ProgressTracker, ProgressUpdate};
use colorbook::project::{ColoringProject, Container};
use colorbook::settings::AppSettings;
use colorbook::{log_err, log_info};

/// Padding between the canvas panel edge and the image.
const CANVAS_MARGIN: f32 = 16.0;

pub struct ColorBookApp {
    settings: AppSettings,
    catalog: Catalog,
    loader: ImageLoader,
    project: ColoringProject,

    gallery: GalleryPanel,
    history_panel: HistoryPanel,
    confirm_clear: ConfirmClearDialog,
    toasts: Toasts,

    /// Completed ids, refreshed whenever progress may have changed.
    completed: Vec<String>,
    canvas_texture: Option<egui::TextureHandle>,
    /// Project revision the texture was built from.
    texture_revision: Option<u64>,
    first_frame: bool,
}

impl ColorBookApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        let asset_root = PathBuf::from(&settings.asset_root);
        let catalog = Catalog::load_or_discover(
            &PathBuf::from(&settings.catalog_path),
            &asset_root.join(IMAGE_SUBDIR),
        );
        log_info!("Catalog: {} animals", catalog.len());

        let tracker = ProgressTracker::new(Box::new(JsonFileStore::new(
            JsonFileStore::default_path(),
        )));
        let mut project = ColoringProject::with_history_limit(tracker, settings.max_undo_steps);
        project.set_hover_opacity(settings.hover_opacity);
        let completed = project.completed_ids();

        Self {
            loader: ImageLoader::new(asset_root),
            settings,
            catalog,
            project,
            gallery: GalleryPanel::default(),
            history_panel: HistoryPanel::default(),
            confirm_clear: ConfirmClearDialog::default(),
            toasts: Toasts::default(),
            completed,
            canvas_texture: None,
            texture_revision: None,
            first_frame: true,
        }
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    fn open_image(&mut self, image_id: &str) {
        let Some(animal) = self.catalog.find(image_id) else {
            log_err!("Unknown animal '{}'", image_id);
            self.toasts.error(LOAD_ERROR_MESSAGE);
            return;
        };
        let filename = animal.svg_filename();
        let name = animal.name.clone();
        match self.project.load(&self.loader, image_id, &filename) {
            Ok(()) => {
                self.settings.last_image = image_id.to_string();
                self.settings.save();
                self.toasts.info(format!("Opened {}", name));
            }
            Err(_) => self.toasts.error(LOAD_ERROR_MESSAGE),
        }
    }

    fn open_random(&mut self) {
        if let Some(id) = self.catalog.random().map(|a| a.id.clone()) {
            self.open_image(&id);
        }
    }

    fn after_edit(&mut self, update: Option<ProgressUpdate>) {
        let Some(update) = update else { return };
        if update.newly_completed {
            self.completed = self.project.completed_ids();
            let name = self
                .catalog
                .find(&self.project.image_id)
                .map(|a| a.name.clone())
                .unwrap_or_else(|| self.project.image_id.clone());
            self.toasts.success(format!("{} completed!", name));
        }
    }

    fn undo(&mut self) {
        self.project.undo();
    }

    fn redo(&mut self) {
        self.project.redo();
    }

    fn request_clear(&mut self) {
        if self.project.document().is_none() {
            return;
        }
        if self.settings.confirm_on_clear {
            self.confirm_clear.request();
        } else {
            let update = self.project.clear_all();
            self.after_edit(update);
        }
    }

    fn export(&mut self) {
        match self.project.export(&self.settings.export_dir()) {
            Ok(Some(path)) => self.toasts.success(format!("Saved {}", path.display())),
            Ok(None) => {}
            Err(e) => {
                log_err!("Export failed: {}", e);
                self.toasts.error(format!("Export failed: {}", e));
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if self.confirm_clear.open {
            return;
        }
        let cmd_shift = egui::Modifiers {
            shift: true,
            ..egui::Modifiers::COMMAND
        };
        let redo = ctx.input_mut(|i| {
            i.consume_key(cmd_shift, egui::Key::Z)
                || i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y)
        });
        let undo = ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z));
        if redo {
            self.redo();
        }
        if undo {
            self.undo();
        }
    }

    // ========================================================================
    // PANELS
    // ========================================================================

    fn show_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let loaded = self.project.document().is_some();
                if ui
                    .add_enabled(self.project.undo_enabled(), egui::Button::new("↶ Undo"))
                    .on_hover_text("Ctrl+Z")
                    .clicked()
                {
                    self.undo();
                }
                if ui
                    .add_enabled(self.project.redo_enabled(), egui::Button::new("↷ Redo"))
                    .on_hover_text("Ctrl+Y")
                    .clicked()
                {
                    self.redo();
                }
                if ui
                    .add_enabled(loaded, egui::Button::new("Clear All"))
                    .clicked()
                {
                    self.request_clear();
                }
                if ui.add_enabled(loaded, egui::Button::new("Export PNG")).clicked() {
                    self.export();
                }

                ui.separator();
                if let Some(progress) = self.project.progress() {
                    ui.add(
                        egui::ProgressBar::new(progress.ratio() as f32)
                            .desired_width(140.0)
                            .text(format!("{}%", progress.percent())),
                    );
                    if self.completed.contains(&self.project.image_id) {
                        ui.label("✔ completed");
                    }
                    ui.separator();
                    ui.weak(format!(
                        "Step {} / {}",
                        self.project.history.index() + 1,
                        self.project.history.len()
                    ));
                }
            });
        });
    }

    fn show_gallery(&mut self, ctx: &egui::Context) {
        let current = self.project.image_id.clone();
        let mut action = None;
        egui::SidePanel::left("gallery")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                ui.heading("Animals");
                action = self.gallery.show(ui, &self.catalog, &self.completed, Some(current.as_str()));
            });
        match action {
            Some(GalleryAction::Open(id)) => self.open_image(&id),
            Some(GalleryAction::Random) => self.open_random(),
            None => {}
        }
    }

    fn show_palette(&mut self, ctx: &egui::Context) {
        let mut jump = None;
        egui::SidePanel::right("palette")
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Colors");
                self.project.palette.show(ui);
                ui.add_space(12.0);
                ui.heading("History");
                jump = self.history_panel.show(ui, &self.project.history);
            });
        if let Some(index) = jump {
            self.project.jump_to(index);
        }
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let revision = self.project.revision();
        if self.texture_revision == Some(revision) {
            return;
        }
        self.texture_revision = Some(revision);
        match self.project.render_view() {
            Some(Ok(pixels)) => {
                let size = [pixels.width() as usize, pixels.height() as usize];
                let image = ColorImage::from_rgba_unmultiplied(size, pixels.as_raw());
                if let Some(tex) = self.canvas_texture.as_mut() {
                    tex.set(image, TextureOptions::LINEAR);
                } else {
                    self.canvas_texture =
                        Some(ctx.load_texture("coloring_canvas", image, TextureOptions::LINEAR));
                }
            }
            Some(Err(e)) => {
                log_err!("Render failed: {}", e);
                self.canvas_texture = None;
            }
            None => self.canvas_texture = None,
        }
    }

    fn show_canvas(&mut self, ctx: &egui::Context) {
        self.refresh_texture(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::central_panel(&ctx.style()).fill(Color32::from_gray(235)))
            .show(ctx, |ui| {
                match self.project.container() {
                    Container::Empty => {
                        ui.centered_and_justified(|ui| {
                            ui.label("Pick an animal from the gallery to start coloring.");
                        });
                        return;
                    }
                    Container::Error(message) => {
                        let message = *message;
                        ui.centered_and_justified(|ui| {
                            ui.colored_label(Color32::from_rgb(192, 57, 43), message);
                        });
                        return;
                    }
                    Container::Document(_) => {}
                }

                let Some(texture) = self.canvas_texture.as_ref() else { return };
                let image_size = texture.size_vec2();
                let available = ui.available_size() - Vec2::splat(CANVAS_MARGIN * 2.0);
                let scale = (available.x / image_size.x)
                    .min(available.y / image_size.y)
                    .max(0.01);
                let display = image_size * scale;
                let texture_id = texture.id();

                let (_, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
                let rect = Rect::from_center_size(response.rect.center(), display);
                let response = ui.interact(rect, ui.id().with("coloring_canvas"), Sense::click());

                ui.painter().image(
                    texture_id,
                    rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );

                let to_image = |p: Pos2| ((p.x - rect.min.x) / scale, (p.y - rect.min.y) / scale);
                let hover = response.hover_pos().map(to_image);
                self.project.pointer_moved(hover);
                if self.project.hovered().is_some() {
                    ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
                }

                if response.clicked() {
                    if let Some((x, y)) = response.interact_pointer_pos().map(to_image) {
                        let update = self.project.click_at(x, y);
                        self.after_edit(update);
                    }
                }
            });
    }
}

impl eframe::App for ColorBookApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            self.first_frame = false;
            let last = self.settings.last_image.clone();
            if !last.is_empty() && self.catalog.find(&last).is_some() {
                self.open_image(&last);
            }
        }

        let title = match self.catalog.find(&self.project.image_id) {
            Some(animal) => format!("ColorBook - {}", animal.name),
            None => "ColorBook".to_string(),
        };
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));

        self.handle_shortcuts(ctx);

        self.show_toolbar(ctx);
        self.show_gallery(ctx);
        self.show_palette(ctx);
        self.show_canvas(ctx);

        match self.confirm_clear.show(ctx) {
            Some(true) => {
                let update = self.project.clear_all();
                self.after_edit(update);
            }
            Some(false) | None => {}
        }

        self.toasts.show(ctx);

        // Edits made this frame are drawn on the next one
        if self.texture_revision != Some(self.project.revision()) {
            ctx.request_repaint();
        }
    }
}
