pub mod background;
pub mod image_editor;
pub mod image_export;
pub mod image_import;
