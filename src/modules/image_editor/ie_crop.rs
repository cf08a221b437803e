//! Crop rectangles and the crop commit.
//!
//! A crop bakes the current render into a brand-new source bitmap. After it the
//! transform is identity and the overlay is recentred on the new bitmap, since
//! its pixels already carry the old rotation and flips.

use image::{RgbaImage, imageops};
use std::sync::Arc;
use crate::error::{EditorError, Result};
use super::ie_geometry::Point;
use super::ie_history::{HistoryEntry, HistoryLedger, SourceImage};
use super::ie_state::{EditState, Filters, Transform};

/// An axis-aligned rectangle in output-buffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CropRect { pub x: f32, pub y: f32, pub width: f32, pub height: f32 }

/// Integer pixel region, already clamped to a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect { pub x: u32, pub y: u32, pub width: u32, pub height: u32 }

impl CropRect {
    /// Normalised rectangle spanned by two drag corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self { x: a.x.min(b.x), y: a.y.min(b.y), width: (a.x - b.x).abs(), height: (a.y - b.y).abs() }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width >= 1.0 && self.height >= 1.0)
    }

    /// Intersection with a `buffer_width × buffer_height` buffer, rounded to
    /// whole pixels. `None` when nothing of the rectangle is left.
    pub fn clamped(&self, buffer_width: u32, buffer_height: u32) -> Option<PixelRect> {
        let x0: f32 = self.x.max(0.0).round();
        let y0: f32 = self.y.max(0.0).round();
        let x1: f32 = (self.x + self.width).min(buffer_width as f32).round();
        let y1: f32 = (self.y + self.height).min(buffer_height as f32).round();
        if x1 <= x0 || y1 <= y0 { return None; }
        Some(PixelRect { x: x0 as u32, y: y0 as u32, width: (x1 - x0) as u32, height: (y1 - y0) as u32 })
    }
}

/// Crops `rendered` (the current output buffer) to `rect`, turns the result
/// into the new source and records exactly one history entry for it.
///
/// `base` is the state the render came from. Text styling and export settings
/// carry over; filters carry over unless `reset_filters` is set, in which case
/// the baked pixels keep their look and the sliders return to neutral.
pub fn commit_crop(
    ledger: &mut HistoryLedger,
    rendered: &RgbaImage,
    rect: CropRect,
    base: &EditState,
    reset_filters: bool,
) -> Result<HistoryEntry> {
    if rect.is_degenerate() { return Err(EditorError::DegenerateCrop); }
    let region: PixelRect = rect.clamped(rendered.width(), rendered.height()).ok_or(EditorError::DegenerateCrop)?;

    let pixels: RgbaImage = imageops::crop_imm(rendered, region.x, region.y, region.width, region.height).to_image();
    let source: Arc<SourceImage> = Arc::new(SourceImage::new(pixels));

    let state = EditState {
        transform: Transform::IDENTITY,
        filters: if reset_filters { Filters::default() } else { base.filters },
        text: base.text.centered_in(region.width, region.height),
        export: base.export,
    };
    log::info!("cropped to {}x{} at ({}, {})", region.width, region.height, region.x, region.y);
    Ok(ledger.commit(source, state).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::image_editor::ie_state::FilterKind;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_corners_normalises() {
        let r = CropRect::from_corners(Point::new(30.0, 5.0), Point::new(10.0, 25.0));
        assert_eq!(r, CropRect { x: 10.0, y: 5.0, width: 20.0, height: 20.0 });
    }

    #[test]
    fn test_clamp_to_buffer() {
        let r = CropRect { x: -10.0, y: 0.0, width: 50.0, height: 10.0 };
        assert_eq!(r.clamped(40, 40), Some(PixelRect { x: 0, y: 0, width: 40, height: 10 }));
        let outside = CropRect { x: 50.0, y: 50.0, width: 10.0, height: 10.0 };
        assert_eq!(outside.clamped(40, 40), None);
    }

    #[test]
    fn test_degenerate_is_rejected_without_commit() {
        let mut ledger = HistoryLedger::default();
        let rendered = RgbaImage::new(10, 10);
        let rect = CropRect { x: 2.0, y: 2.0, width: 0.0, height: 5.0 };
        let err = commit_crop(&mut ledger, &rendered, rect, &EditState::default(), false).unwrap_err();
        assert!(matches!(err, EditorError::DegenerateCrop));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_commit_bakes_pixels_and_resets_transform() {
        let rendered = RgbaImage::from_fn(20, 10, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let mut base = EditState::default();
        base.transform = base.transform.rotated_right().flipped_vertical();
        base.filters.set(FilterKind::Grayscale, 40.0);

        let mut ledger = HistoryLedger::default();
        let rect = CropRect { x: 5.0, y: 2.0, width: 8.0, height: 4.0 };
        let entry = commit_crop(&mut ledger, &rendered, rect, &base, false).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!((entry.source.width(), entry.source.height()), (8, 4));
        assert_eq!(entry.source.pixels().get_pixel(0, 0).0, [5, 2, 0, 255]);
        assert_eq!(entry.state.transform, Transform::IDENTITY);
        assert_eq!((entry.state.text.x, entry.state.text.y), (4.0, 2.0));
        assert_eq!(entry.state.filters.grayscale, 40.0);
    }

    #[test]
    fn test_commit_can_reset_filters() {
        let rendered = RgbaImage::new(10, 10);
        let mut base = EditState::default();
        base.filters.set(FilterKind::Invert, 100.0);
        let mut ledger = HistoryLedger::default();
        let rect = CropRect { x: 0.0, y: 0.0, width: 5.0, height: 5.0 };
        let entry = commit_crop(&mut ledger, &rendered, rect, &base, true).unwrap();
        assert!(entry.state.filters.is_identity());
    }
}
