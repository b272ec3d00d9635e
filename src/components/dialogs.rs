use eframe::egui;
use std::time::{Duration, Instant};

// ============================================================================
// CONFIRM CLEAR DIALOG
// ============================================================================

/// Modal asking whether Clear All may wipe every fill.
#[derive(Default)]
pub struct ConfirmClearDialog {
    pub open: bool,
}

impl ConfirmClearDialog {
    pub fn request(&mut self) {
        self.open = true;
    }

    /// Show the dialog. Returns `Some(true)` when confirmed, `Some(false)`
    /// when cancelled and `None` while still open (or closed).
    pub fn show(&mut self, ctx: &egui::Context) -> Option<bool> {
        if !self.open {
            return None;
        }

        // Keyboard: Enter = Clear, Esc = Cancel
        let enter = ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter));
        let esc = ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Escape));
        let mut result = if enter {
            Some(true)
        } else if esc {
            Some(false)
        } else {
            None
        };

        egui::Window::new("confirm_clear_dialog_internal")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(280.0);
                ui.heading("Clear all colors?");
                ui.add_space(4.0);
                ui.label("Every shape goes back to white. You can undo this.");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Clear All").clicked() {
                        result = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        result = Some(false);
                    }
                });
            });

        if result.is_some() {
            self.open = false;
        }
        result
    }
}

// ============================================================================
// TOASTS
// ============================================================================

/// How long a toast stays on screen.
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created: Instant,
}

/// Short-lived notifications stacked in the bottom-right corner.
#[derive(Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.push_at(kind, message, Instant::now());
    }

    fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, created: Instant) {
        self.items.push(Toast {
            message: message.into(),
            kind,
            created,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop toasts older than [`TOAST_DURATION`].
    pub fn expire(&mut self, now: Instant) {
        self.items
            .retain(|t| now.saturating_duration_since(t.created) < TOAST_DURATION);
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.expire(Instant::now());
        if self.items.is_empty() {
            return;
        }

        egui::Area::new("toasts_area")
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.items {
                    let fill = match toast.kind {
                        ToastKind::Info => egui::Color32::from_rgb(52, 73, 94),
                        ToastKind::Success => egui::Color32::from_rgb(39, 174, 96),
                        ToastKind::Error => egui::Color32::from_rgb(192, 57, 43),
                    };
                    egui::Frame::none()
                        .fill(fill)
                        .rounding(6.0)
                        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                        .show(ui, |ui| {
                            ui.colored_label(egui::Color32::WHITE, &toast.message);
                        });
                    ui.add_space(6.0);
                }
            });

        // Keep repainting so expired toasts disappear without input
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}
