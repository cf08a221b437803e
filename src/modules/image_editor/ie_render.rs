use image::{RgbaImage, imageops};
use crate::error::{EditorError, Result};
use super::ie_geometry::output_size;
use super::ie_helpers::apply_filters;
use super::ie_history::SourceImage;
use super::ie_state::{EditState, Transform};
use super::ie_text::FontBook;

/// Produces the output bitmap for `source` under `state`. Pure: the same
/// inputs give byte-identical pixels, and the source is never touched.
///
/// Order is fixed: flips, clockwise rotation, colour filters and blur, then
/// the text overlay on top of the filtered pixels.
pub fn render(source: &SourceImage, state: &EditState, fonts: &FontBook) -> Result<RgbaImage> {
    if source.width() == 0 || source.height() == 0 {
        return Err(EditorError::DecodeFailure("source bitmap has no pixels".to_string()));
    }

    let mut buf: RgbaImage = apply_transform(source.pixels(), &state.transform);
    debug_assert_eq!(
        buf.dimensions(),
        output_size(source.width(), source.height(), state.transform.rotation_degrees)
    );

    log::debug!("render {}x{} {}", buf.width(), buf.height(), state.filters.descriptor());
    apply_filters(&mut buf, &state.filters);

    let text = &state.text;
    if text.visible && !text.content.is_empty() && !fonts.stamp(&mut buf, text) {
        log::warn!("text overlay skipped: no font available for '{}'", text.font_family);
    }
    Ok(buf)
}

/// Flips are applied in source orientation, before rotating.
fn apply_transform(pixels: &RgbaImage, transform: &Transform) -> RgbaImage {
    let mut buf: RgbaImage = pixels.clone();
    if transform.flip_horizontal { imageops::flip_horizontal_in_place(&mut buf); }
    if transform.flip_vertical { imageops::flip_vertical_in_place(&mut buf); }
    match transform.quarter_turns() {
        1 => imageops::rotate90(&buf),
        2 => imageops::rotate180(&buf),
        3 => imageops::rotate270(&buf),
        _ => buf,
    }
}
