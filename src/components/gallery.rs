use eframe::egui;

use crate::catalog::Catalog;

/// What the user asked for in the gallery this frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GalleryAction {
    Open(String),
    Random,
}

/// Catalog browser: category filter, search box and the matching entries.
#[derive(Default)]
pub struct GalleryPanel {
    pub category: String,
    pub search: String,
}

impl GalleryPanel {
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        catalog: &Catalog,
        completed: &[String],
        current: Option<&str>,
    ) -> Option<GalleryAction> {
        let mut action = None;

        let selected_text = if self.category.is_empty() {
            "All categories".to_string()
        } else {
            self.category.clone()
        };
        egui::ComboBox::from_id_source("gallery_category_combo")
            .width(ui.available_width())
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut self.category, String::new(), "All categories");
                for category in catalog.categories() {
                    let label = category.clone();
                    ui.selectable_value(&mut self.category, category, label);
                }
            });

        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Search animals…")
                .desired_width(f32::INFINITY),
        );

        if ui
            .add_enabled(!catalog.is_empty(), egui::Button::new("🎲 Random"))
            .clicked()
        {
            action = Some(GalleryAction::Random);
        }
        ui.separator();

        let matches = catalog.filter(&self.category, &self.search);
        if matches.is_empty() {
            ui.weak("No animals found");
            return action;
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for animal in matches {
                    let done = completed.iter().any(|id| *id == animal.id);
                    let label = if done {
                        format!("✔ {}", animal.name)
                    } else {
                        animal.name.clone()
                    };
                    let is_current = current == Some(animal.id.as_str());
                    let response = ui.selectable_label(is_current, label);
                    let response = if animal.description.is_empty() {
                        response
                    } else {
                        response.on_hover_text(animal.description.as_str())
                    };
                    if response.clicked() && !is_current {
                        action = Some(GalleryAction::Open(animal.id.clone()));
                    }
                }
            });

        action
    }
}
