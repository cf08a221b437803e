use eframe::egui;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use crate::modules::image_export::{ExportFormat, clamp_quality};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbaColor { pub r: u8, pub g: u8, pub b: u8, pub a: u8 }

impl RgbaColor {
    pub const WHITE: RgbaColor = RgbaColor { r: 255, g: 255, b: 255, a: 255 };

    pub fn to_egui(&self) -> egui::Color32 { egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a) }
    pub fn from_egui(c: egui::Color32) -> Self {
        let [r, g, b, a] = c.to_srgba_unmultiplied();
        Self { r, g, b, a }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 { format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b) }
        else { format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a) }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex: &str = hex.trim().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self { r: channel(0)?, g: channel(2)?, b: channel(4)?, a: 255 }),
            8 => Some(Self { r: channel(0)?, g: channel(2)?, b: channel(4)?, a: channel(6)? }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Always a multiple of 90; unbounded, wraps every 360.
    pub rotation_degrees: i32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl Transform {
    pub const IDENTITY: Transform = Transform { rotation_degrees: 0, flip_horizontal: false, flip_vertical: false };

    pub fn rotated_right(self) -> Self { Self { rotation_degrees: self.rotation_degrees + 90, ..self } }
    pub fn rotated_left(self) -> Self { Self { rotation_degrees: self.rotation_degrees - 90, ..self } }
    pub fn flipped_horizontal(self) -> Self { Self { flip_horizontal: !self.flip_horizontal, ..self } }
    pub fn flipped_vertical(self) -> Self { Self { flip_vertical: !self.flip_vertical, ..self } }

    /// Clockwise quarter turns in `0..4`. Off-grid angles snap to the nearest quarter.
    pub fn quarter_turns(&self) -> u32 {
        ((self.rotation_degrees as f32 / 90.0).round() as i32).rem_euclid(4) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind { Brightness, Contrast, Saturate, Grayscale, Sepia, Invert, HueRotate, Blur }

impl FilterKind {
    /// Application order of the composed filter. Changing it changes output.
    pub const ORDER: [FilterKind; 8] = [
        FilterKind::Brightness, FilterKind::Contrast, FilterKind::Saturate, FilterKind::Grayscale,
        FilterKind::Sepia, FilterKind::Invert, FilterKind::HueRotate, FilterKind::Blur,
    ];

    pub fn range(&self) -> RangeInclusive<f32> {
        match self {
            FilterKind::Brightness | FilterKind::Contrast | FilterKind::Saturate => 0.0..=200.0,
            FilterKind::Grayscale | FilterKind::Sepia | FilterKind::Invert => 0.0..=100.0,
            FilterKind::HueRotate => 0.0..=360.0,
            FilterKind::Blur => 0.0..=20.0,
        }
    }

    pub fn identity(&self) -> f32 {
        match self {
            FilterKind::Brightness | FilterKind::Contrast | FilterKind::Saturate => 100.0,
            _ => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Brightness => "Brightness",
            FilterKind::Contrast => "Contrast",
            FilterKind::Saturate => "Saturate",
            FilterKind::Grayscale => "Grayscale",
            FilterKind::Sepia => "Sepia",
            FilterKind::Invert => "Invert",
            FilterKind::HueRotate => "Hue Rotate",
            FilterKind::Blur => "Blur",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            FilterKind::HueRotate => "deg",
            FilterKind::Blur => "px",
            _ => "%",
        }
    }

    fn css_name(&self) -> &'static str {
        match self {
            FilterKind::Brightness => "brightness",
            FilterKind::Contrast => "contrast",
            FilterKind::Saturate => "saturate",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
            FilterKind::Invert => "invert",
            FilterKind::HueRotate => "hue-rotate",
            FilterKind::Blur => "blur",
        }
    }
}

/// The eight tonal adjustments as one value. Every setter clamps into the
/// adjustment's domain, so a `Filters` is always renderable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub brightness: f32,
    pub contrast: f32,
    pub saturate: f32,
    pub grayscale: f32,
    pub sepia: f32,
    pub invert: f32,
    pub hue_rotate: f32,
    pub blur: f32,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            brightness: 100.0, contrast: 100.0, saturate: 100.0,
            grayscale: 0.0, sepia: 0.0, invert: 0.0, hue_rotate: 0.0, blur: 0.0,
        }
    }
}

impl Filters {
    pub fn get(&self, kind: FilterKind) -> f32 {
        match kind {
            FilterKind::Brightness => self.brightness,
            FilterKind::Contrast => self.contrast,
            FilterKind::Saturate => self.saturate,
            FilterKind::Grayscale => self.grayscale,
            FilterKind::Sepia => self.sepia,
            FilterKind::Invert => self.invert,
            FilterKind::HueRotate => self.hue_rotate,
            FilterKind::Blur => self.blur,
        }
    }

    pub fn set(&mut self, kind: FilterKind, value: f32) {
        let range: RangeInclusive<f32> = kind.range();
        let value: f32 = if value.is_nan() { kind.identity() } else { value.clamp(*range.start(), *range.end()) };
        let slot: &mut f32 = match kind {
            FilterKind::Brightness => &mut self.brightness,
            FilterKind::Contrast => &mut self.contrast,
            FilterKind::Saturate => &mut self.saturate,
            FilterKind::Grayscale => &mut self.grayscale,
            FilterKind::Sepia => &mut self.sepia,
            FilterKind::Invert => &mut self.invert,
            FilterKind::HueRotate => &mut self.hue_rotate,
            FilterKind::Blur => &mut self.blur,
        };
        *slot = value;
    }

    #[cfg(test)]
    pub fn with(mut self, kind: FilterKind, value: f32) -> Self { self.set(kind, value); self }

    pub fn is_identity(&self) -> bool {
        FilterKind::ORDER.iter().all(|k| self.get(*k) == k.identity())
    }

    /// Canvas-style descriptor, e.g. `brightness(100%) ... blur(0px)`, logged
    /// with each render.
    pub fn descriptor(&self) -> String {
        FilterKind::ORDER.iter()
            .map(|k| format!("{}({}{})", k.css_name(), self.get(*k), k.unit()))
            .collect::<Vec<String>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverlay {
    pub content: String,
    /// Centre of the text in output-buffer pixels.
    pub x: f32,
    pub y: f32,
    pub color: RgbaColor,
    pub font_size: f32,
    pub font_family: String,
    pub visible: bool,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            content: "Hello World".to_string(),
            x: 50.0, y: 50.0,
            color: RgbaColor::WHITE,
            font_size: 40.0,
            font_family: "Sans".to_string(),
            visible: false,
        }
    }
}

impl TextOverlay {
    pub fn centered_in(&self, width: u32, height: u32) -> Self {
        Self { x: width as f32 / 2.0, y: height as f32 / 2.0, ..self.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    /// 0.1–1.0, only used for JPEG.
    pub quality: f32,
}

impl Default for ExportSettings {
    fn default() -> Self { Self { format: ExportFormat::Jpeg, quality: 0.9 } }
}

impl ExportSettings {
    pub fn with_quality(self, quality: f32) -> Self { Self { quality: clamp_quality(quality), ..self } }
}

/// Everything needed to reproduce a render from a source bitmap.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditState {
    pub transform: Transform,
    pub filters: Filters,
    pub text: TextOverlay,
    pub export: ExportSettings,
}

impl EditState {
    /// State for a freshly loaded `width × height` image. Text styling is
    /// carried over from `previous`; the overlay starts hidden and centred.
    pub fn for_new_image(width: u32, height: u32, previous: &TextOverlay, export: ExportSettings) -> Self {
        Self {
            transform: Transform::IDENTITY,
            filters: Filters::default(),
            text: TextOverlay { visible: false, ..previous.centered_in(width, height) },
            export,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hex_round_trip() {
        let c = RgbaColor::from_hex("#ff8000").unwrap();
        assert_eq!(c, RgbaColor { r: 255, g: 128, b: 0, a: 255 });
        assert_eq!(c.to_hex(), "#ff8000");
        assert_eq!(RgbaColor::from_hex("10203040").unwrap().a, 0x40);
        assert_eq!(RgbaColor::from_hex("#fff"), None);
        assert_eq!(RgbaColor::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_rotation_wraps() {
        let t = Transform::IDENTITY.rotated_right().rotated_right().rotated_right().rotated_right();
        assert_eq!(t.rotation_degrees, 360);
        assert_eq!(t.quarter_turns(), 0);
        assert_eq!(Transform::IDENTITY.rotated_left().quarter_turns(), 3);
    }

    #[test]
    fn test_filter_set_clamps_to_domain() {
        let mut f = Filters::default();
        f.set(FilterKind::Brightness, 500.0);
        f.set(FilterKind::Sepia, -3.0);
        f.set(FilterKind::Blur, f32::NAN);
        assert_eq!(f.brightness, 200.0);
        assert_eq!(f.sepia, 0.0);
        assert_eq!(f.blur, 0.0);
    }

    #[test]
    fn test_default_filters_are_identity() {
        assert!(Filters::default().is_identity());
        assert!(!Filters::default().with(FilterKind::Invert, 1.0).is_identity());
    }

    #[test]
    fn test_descriptor_order() {
        let d = Filters::default().descriptor();
        assert!(d.starts_with("brightness(100%) contrast(100%) saturate(100%)"));
        assert!(d.ends_with("hue-rotate(0deg) blur(0px)"));
    }

    #[test]
    fn test_new_image_state_carries_text_style() {
        let previous = TextOverlay { content: "Mark".into(), font_size: 12.0, visible: true, ..TextOverlay::default() };
        let state = EditState::for_new_image(100, 50, &previous, ExportSettings::default());
        assert_eq!(state.text.content, "Mark");
        assert_eq!(state.text.font_size, 12.0);
        assert!(!state.text.visible);
        assert_eq!((state.text.x, state.text.y), (50.0, 25.0));
        assert_eq!(state.transform, Transform::IDENTITY);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut working = EditState::default();
        let snapshot = working.clone();
        working.text.content.push_str("!!!");
        working.filters.set(FilterKind::Contrast, 150.0);
        assert_eq!(snapshot.text.content, "Hello World");
        assert_eq!(snapshot.filters.contrast, 100.0);
    }
}
