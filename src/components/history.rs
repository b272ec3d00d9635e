use eframe::egui;
use std::collections::VecDeque;

/// Default number of snapshots kept.
pub const DEFAULT_MAX_HISTORY: usize = 20;

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Serialized copy of the whole document at one point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub markup: String,
    /// The action this snapshot undoes or redoes ("Color shape 3 #4ECDC4", "Clear all").
    pub description: String,
}

impl HistorySnapshot {
    pub fn memory_size(&self) -> usize {
        self.markup.len() + self.description.len()
    }
}

/// Position of the active index on the line of document states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryState {
    /// Nothing captured yet (before the first successful load).
    Uninitialized,
    /// Index 0. Also reported when nothing has been recorded since loading.
    AtEarliest,
    Middle,
    /// Index = len - 1.
    AtLatest,
}

// ============================================================================
// HISTORY MANAGER - Bounded undo/redo stacks of full-document snapshots
// ============================================================================

/// Bounded, linear undo/redo over full-document snapshots.
///
/// Each action records the document as it was *before* the change. The
/// document on screen is never stored: undo and redo hand it back in as
/// `current` and it lands on the opposite stack, so `max_history_size`
/// actions stay undoable all the way back to the loaded image.
///
/// Positions on the line run from 0 (oldest reachable state) to `len() - 1`;
/// `index()` is the position shown on screen.
pub struct HistoryManager {
    /// Pre-action states, oldest first.
    undo_stack: VecDeque<HistorySnapshot>,
    /// States to return to on redo, next one last.
    redo_stack: Vec<HistorySnapshot>,
    max_history_size: usize,
    /// Label of position 0 ("Open fox", or the newest evicted action).
    base_description: Option<String>,
    /// Running byte total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryManager {
    /// `max_history_size` is clamped to at least 1.
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_history_size: max_history_size.max(1),
            base_description: None,
            total_memory: 0,
        }
    }

    /// Start a fresh line at the freshly loaded document.
    pub fn initialize(&mut self, description: impl Into<String>) {
        self.clear();
        self.base_description = Some(description.into());
    }

    /// Record the document state from just before an action.
    pub fn record(&mut self, before: String, description: impl Into<String>) {
        if self.base_description.is_none() {
            return;
        }
        // Discard the redo branch
        for dropped in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(dropped.memory_size());
        }

        let entry = HistorySnapshot {
            markup: before,
            description: description.into(),
        };
        self.total_memory += entry.memory_size();
        self.undo_stack.push_back(entry);

        self.prune();
    }

    /// Step back one action. `current` is the markup on screen; returns the
    /// markup to restore, or `None` at the earliest position.
    pub fn undo(&mut self, current: String) -> Option<String> {
        let entry = self.undo_stack.pop_back()?;
        let back = HistorySnapshot {
            markup: current,
            description: entry.description.clone(),
        };
        self.total_memory = self.total_memory + back.memory_size() - entry.memory_size();
        self.redo_stack.push(back);
        Some(entry.markup)
    }

    /// Step forward one action. Returns `None` at the latest position.
    pub fn redo(&mut self, current: String) -> Option<String> {
        let entry = self.redo_stack.pop()?;
        let back = HistorySnapshot {
            markup: current,
            description: entry.description.clone(),
        };
        self.total_memory = self.total_memory + back.memory_size() - entry.memory_size();
        self.undo_stack.push_back(back);
        Some(entry.markup)
    }

    /// Move to position `index` without discarding anything.
    pub fn jump_to(&mut self, index: usize, current: String) -> Option<String> {
        if index >= self.len() || index == self.index() {
            return None;
        }
        let mut markup = current;
        while self.index() > index {
            markup = self.undo(markup)?;
        }
        while self.index() < index {
            markup = self.redo(markup)?;
        }
        Some(markup)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn state(&self) -> HistoryState {
        if self.base_description.is_none() {
            HistoryState::Uninitialized
        } else if self.undo_stack.is_empty() {
            HistoryState::AtEarliest
        } else if self.redo_stack.is_empty() {
            HistoryState::AtLatest
        } else {
            HistoryState::Middle
        }
    }

    pub fn index(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of positions on the line, the on-screen one included.
    pub fn len(&self) -> usize {
        if self.base_description.is_none() {
            0
        } else {
            self.undo_stack.len() + self.redo_stack.len() + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.base_description.is_none()
    }

    /// Stored snapshots across both stacks; never above `max_history_size`.
    pub fn snapshot_count(&self) -> usize {
        self.undo_stack.len() + self.redo_stack.len()
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|s| s.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|s| s.description.as_str())
    }

    /// One label per position, oldest first.
    pub fn descriptions(&self) -> Vec<&str> {
        let Some(base) = self.base_description.as_deref() else {
            return Vec::new();
        };
        std::iter::once(base)
            .chain(self.undo_stack.iter().map(|s| s.description.as_str()))
            .chain(self.redo_stack.iter().rev().map(|s| s.description.as_str()))
            .collect()
    }

    /// Byte total of all stored snapshots (cached).
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    /// Evict the oldest undo steps past the count limit.
    fn prune(&mut self) {
        while self.snapshot_count() > self.max_history_size {
            let Some(removed) = self.undo_stack.pop_front() else {
                break;
            };
            self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            self.base_description = Some(removed.description);
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.base_description = None;
        self.total_memory = 0;
    }
}

// ============================================================================
// HISTORY PANEL
// ============================================================================

#[derive(Default)]
pub struct HistoryPanel {
    show_memory_info: bool,
}

impl HistoryPanel {
    /// Draw the snapshot list. Returns the index the user clicked, if any.
    pub fn show(&mut self, ui: &mut egui::Ui, history: &HistoryManager) -> Option<usize> {
        ui.horizontal(|ui| {
            ui.label(format!("Step {} of {}", history.index() + 1, history.len().max(1)));
            if ui.small_button("ℹ").on_hover_text("Show memory info").clicked() {
                self.show_memory_info = !self.show_memory_info;
            }
        });

        if self.show_memory_info {
            let kb = history.memory_usage() as f64 / 1024.0;
            ui.label(format!("Memory: {:.1} KB", kb));
        }

        let mut revert_to = None;
        egui::ScrollArea::vertical()
            .max_height(180.0)
            .show(ui, |ui| {
                let items = history.descriptions();
                if items.is_empty() {
                    ui.weak("No history yet");
                    return;
                }
                // Newest first
                for (i, desc) in items.iter().enumerate().rev() {
                    let is_current = i == history.index();
                    let text = if is_current {
                        egui::RichText::new(format!("▶ {}", desc)).strong().size(11.0)
                    } else if i > history.index() {
                        egui::RichText::new(format!("  {}", desc)).weak().italics().size(11.0)
                    } else {
                        egui::RichText::new(format!("  {}", desc)).weak().size(11.0)
                    };
                    let response = ui.add(egui::Label::new(text).sense(egui::Sense::click()));
                    if response.clicked() && !is_current {
                        revert_to = Some(i);
                    }
                    if !is_current {
                        response.on_hover_text("Click to return to this state");
                    }
                }
            });
        revert_to
    }
}
