pub mod dialogs;
pub mod gallery;
pub mod history;
pub mod palette;
