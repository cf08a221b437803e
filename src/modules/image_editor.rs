//! The editing session: edit state, history, render pipeline and the egui
//! surface on top of it.

mod ie_crop;
mod ie_geometry;
mod ie_helpers;
mod ie_history;
mod ie_interaction;
mod ie_main;
mod ie_render;
mod ie_state;
mod ie_text;
mod ie_ui;

pub use ie_history::SourceImage;
pub use ie_interaction::Tool;
pub use ie_main::ImageEditor;
pub use ie_state::ExportSettings;
pub use ie_text::FontBook;
