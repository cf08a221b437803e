use image::ImageFormat;
use std::path::{Path, PathBuf};
use crate::error::{EditorError, Result};
use crate::modules::image_editor::SourceImage;

/// Extensions offered in the open dialog and accepted from drag-and-drop.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff", "ico"];

/// A fully decoded image, ready to become the editor's source.
#[derive(Debug)]
pub struct LoadedImage {
    pub name: String,
    pub source: SourceImage,
}

pub fn has_image_extension(name: &str) -> bool {
    Path::new(name).extension().and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Decodes encoded bytes. Content sniffing decides; the name's extension is
/// only consulted when the bytes carry no recognisable signature.
pub fn decode_image(name: &str, bytes: &[u8]) -> Result<LoadedImage> {
    let format: ImageFormat = match image::guess_format(bytes) {
        Ok(format) => format,
        Err(_) if has_image_extension(name) => {
            ImageFormat::from_path(name).map_err(|e| EditorError::DecodeFailure(e.to_string()))?
        }
        Err(_) => return Err(EditorError::UnsupportedMedia(name.to_string())),
    };

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| EditorError::DecodeFailure(format!("{}: {}", name, e)))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(EditorError::DecodeFailure(format!("{}: image has no pixels", name)));
    }
    Ok(LoadedImage { name: name.to_string(), source: SourceImage::from_dynamic(img) })
}

pub fn read_image_file(path: &PathBuf) -> Result<LoadedImage> {
    let name: String = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let bytes: Vec<u8> = std::fs::read(path)?;
    decode_image(&name, &bytes)
}
