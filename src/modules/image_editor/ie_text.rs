use ab_glyph::{Font, FontVec, Glyph, GlyphId, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::error::{EditorError, Result};
use super::ie_state::{RgbaColor, TextOverlay};

/// Shipped with the binary so text renders even on a machine without fonts.
static FONT_DEJAVU_SANS: &[u8] = include_bytes!("../../../assets/DejaVuSans/DejaVuSans.ttf");
const BUNDLED_FAMILY: &str = "DejaVu Sans";

/// Tried in order when the requested family is unknown.
const FALLBACK_FAMILIES: &[&str] = &[
    "dejavusans", "arial", "liberationsans", "notosansregular", "robotoregular",
    "ubunturegular", "helvetica", "segoeui", "verdana",
];

/// Average advance used when no font face is available at all.
const APPROX_ADVANCE: f32 = 0.58;

/// Width of `text` in output-buffer pixels, as laid out for rendering.
pub trait TextMetrics {
    fn text_width(&self, text: &TextOverlay) -> f32;
}

/// `"DejaVu Sans"`, `"dejavu-sans"` and `"DejaVuSans"` all map to `dejavusans`.
pub fn font_key(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).map(|c| c.to_ascii_lowercase()).collect()
}

pub fn approx_text_width(text: &TextOverlay) -> f32 {
    text.content.chars().count() as f32 * text.font_size * APPROX_ADVANCE
}

/// Font faces known to the renderer. Discovery only indexes files; a face is
/// read from disk the first time its family is asked for.
#[derive(Default)]
pub struct FontBook {
    index: BTreeMap<String, (String, PathBuf)>,
    loaded: BTreeMap<String, FontVec>,
    /// Display names of faces registered from memory rather than a file.
    embedded: BTreeMap<String, String>,
    fallback: Option<String>,
}

impl FontBook {
    pub fn empty() -> Self { Self::default() }

    /// A book holding only the bundled face.
    pub fn bundled() -> Self {
        let mut book: FontBook = Self::empty();
        if let Err(e) = book.add_font_bytes(BUNDLED_FAMILY, FONT_DEJAVU_SANS.to_vec()) {
            log::warn!("bundled font unusable: {}", e);
        }
        book
    }

    pub fn discover(font_files: &BTreeMap<String, PathBuf>, font_dirs: &[PathBuf]) -> Self {
        let mut book: FontBook = Self::bundled();
        let mut dirs: Vec<PathBuf> = font_dirs.to_vec();
        dirs.extend(system_font_dirs());

        for dir in dirs.iter().filter(|d| d.is_dir()) {
            for entry in WalkDir::new(dir).max_depth(4).into_iter().filter_map(|e| e.ok()) {
                let path: &Path = entry.path();
                let is_font: bool = path.extension().and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
                    .unwrap_or(false);
                if !is_font { continue; }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    book.index.entry(font_key(stem)).or_insert_with(|| (stem.to_string(), path.to_path_buf()));
                }
            }
        }
        // Explicit mappings win over anything found on disk.
        for (family, path) in font_files {
            book.index.insert(font_key(family), (family.clone(), path.clone()));
        }

        for key in FALLBACK_FAMILIES {
            if book.load_key(key) {
                book.fallback = Some(key.to_string());
                break;
            }
        }
        if book.fallback.is_none() {
            if let Some(key) = book.index.keys().next().cloned() {
                if book.load_key(&key) { book.fallback = Some(key); }
            }
        }

        match &book.fallback {
            Some(key) => log::info!("indexed {} font files, fallback face '{}'", book.index.len(), key),
            None => log::warn!("no usable font found; text overlays will not be drawn"),
        }
        book
    }

    /// Registers a face from raw TrueType/OpenType bytes.
    pub fn add_font_bytes(&mut self, family: &str, bytes: Vec<u8>) -> Result<()> {
        let font: FontVec = FontVec::try_from_vec(bytes).map_err(|_| EditorError::FontLoad(family.to_string()))?;
        let key: String = font_key(family);
        self.loaded.insert(key.clone(), font);
        self.embedded.insert(key.clone(), family.to_string());
        if self.fallback.is_none() { self.fallback = Some(key); }
        Ok(())
    }

    /// Loads the family's face if it is indexed but not yet in memory.
    pub fn ensure_loaded(&mut self, family: &str) -> bool {
        self.load_key(&font_key(family))
    }

    fn load_key(&mut self, key: &str) -> bool {
        if self.loaded.contains_key(key) { return true; }
        let Some((name, path)) = self.index.get(key).cloned() else { return false };
        let font: Option<FontVec> = std::fs::read(&path).ok().and_then(|bytes| FontVec::try_from_vec(bytes).ok());
        match font {
            Some(font) => {
                log::debug!("loaded font '{}' from {}", name, path.display());
                self.loaded.insert(key.to_string(), font);
                true
            }
            None => {
                log::warn!("{}", EditorError::FontLoad(path.display().to_string()));
                self.index.remove(key);
                false
            }
        }
    }

    /// Display names of every indexed or loaded family, sorted.
    pub fn families(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.values().map(|(name, _)| name.clone()).collect();
        for (key, name) in &self.embedded {
            if !self.index.contains_key(key) { names.push(name.clone()); }
        }
        names.sort();
        names.dedup();
        names
    }

    fn face(&self, family: &str) -> Option<&FontVec> {
        self.loaded.get(&font_key(family))
            .or_else(|| self.fallback.as_ref().and_then(|k| self.loaded.get(k)))
    }

    /// Draws the overlay centred on `(text.x, text.y)`, vertically on the middle
    /// of the em box. Returns false when there is no face to draw with.
    pub fn stamp(&self, buf: &mut RgbaImage, text: &TextOverlay) -> bool {
        if text.content.is_empty() || text.font_size <= 0.0 { return true; }
        let Some(font) = self.face(&text.font_family) else { return false };

        let scale: PxScale = PxScale::from(text.font_size);
        let scaled = font.as_scaled(scale);
        let (glyphs, width) = layout_line(font, scale, &text.content);
        let origin_x: f32 = text.x - width / 2.0;
        let baseline: f32 = text.y + (scaled.ascent() + scaled.descent()) / 2.0;

        let (w, h) = (buf.width() as i32, buf.height() as i32);
        for mut glyph in glyphs {
            glyph.position = point(glyph.position.x + origin_x, baseline);
            let Some(outlined) = font.outline_glyph(glyph) else { continue };
            let bounds: ab_glyph::Rect = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px: i32 = bounds.min.x as i32 + gx as i32;
                let py: i32 = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= w || py >= h { return; }
                blend_over(buf.get_pixel_mut(px as u32, py as u32), text.color, coverage);
            });
        }
        true
    }
}

impl TextMetrics for FontBook {
    fn text_width(&self, text: &TextOverlay) -> f32 {
        match self.face(&text.font_family) {
            Some(font) if text.font_size > 0.0 => layout_line(font, PxScale::from(text.font_size), &text.content).1,
            _ => approx_text_width(text),
        }
    }
}

/// Positions glyphs on one line starting at x = 0, with kerning.
fn layout_line(font: &FontVec, scale: PxScale, content: &str) -> (Vec<Glyph>, f32) {
    let scaled = font.as_scaled(scale);
    let mut glyphs: Vec<Glyph> = Vec::with_capacity(content.len());
    let mut caret: f32 = 0.0;
    let mut previous: Option<GlyphId> = None;
    for ch in content.chars().filter(|c| !c.is_control()) {
        let id: GlyphId = font.glyph_id(ch);
        if let Some(prev) = previous { caret += scaled.kern(prev, id); }
        glyphs.push(id.with_scale_and_position(scale, point(caret, 0.0)));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }
    (glyphs, caret)
}

/// Straight-alpha "source over" of `color` at `coverage` onto `dst`.
fn blend_over(dst: &mut Rgba<u8>, color: RgbaColor, coverage: f32) {
    let src_a: f32 = (coverage * color.a as f32 / 255.0).clamp(0.0, 1.0);
    if src_a <= 0.0 { return; }
    let [dr, dg, db, da] = dst.0;
    let dst_a: f32 = da as f32 / 255.0;
    let out_a: f32 = src_a + dst_a * (1.0 - src_a);
    if out_a <= 1e-5 { return; }
    let mix = |s: u8, d: u8| -> u8 {
        let v: f32 = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    dst.0 = [mix(color.r, dr), mix(color.g, dg), mix(color.b, db), (out_a * 255.0).round().clamp(0.0, 255.0) as u8];
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs_found: Vec<PathBuf> = Vec::new();
    if let Some(user) = dirs::font_dir() { dirs_found.push(user); }
    if cfg!(target_os = "windows") {
        let windir: String = std::env::var("WINDIR").unwrap_or_else(|_| "C:\\Windows".to_string());
        dirs_found.push(PathBuf::from(windir).join("Fonts"));
    } else if cfg!(target_os = "macos") {
        dirs_found.push(PathBuf::from("/System/Library/Fonts"));
        dirs_found.push(PathBuf::from("/Library/Fonts"));
    } else {
        dirs_found.push(PathBuf::from("/usr/share/fonts"));
        dirs_found.push(PathBuf::from("/usr/local/share/fonts"));
    }
    dirs_found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_font_key_normalises() {
        assert_eq!(font_key("DejaVu Sans"), "dejavusans");
        assert_eq!(font_key("Roboto-Regular"), "robotoregular");
    }

    #[test]
    fn test_empty_book_approximates_width() {
        let text = TextOverlay { content: "Hi".into(), font_size: 40.0, ..TextOverlay::default() };
        let w = FontBook::empty().text_width(&text);
        assert!((w - 2.0 * 40.0 * APPROX_ADVANCE).abs() < 1e-4);
    }

    #[test]
    fn test_empty_book_cannot_stamp() {
        let mut buf = RgbaImage::new(10, 10);
        let text = TextOverlay { visible: true, ..TextOverlay::default() };
        assert!(!FontBook::empty().stamp(&mut buf, &text));
        assert_eq!(buf, RgbaImage::new(10, 10));
    }

    #[test]
    fn test_bundled_face_is_the_fallback() {
        let book = FontBook::bundled();
        assert_eq!(book.families(), vec!["DejaVu Sans".to_string()]);
        let text = TextOverlay { content: "Hi".into(), font_family: "No Such Font".into(), ..TextOverlay::default() };
        assert!(book.face(&text.font_family).is_some());
        let mut buf = RgbaImage::from_pixel(120, 80, Rgba([0, 0, 0, 255]));
        assert!(book.stamp(&mut buf, &TextOverlay { x: 60.0, y: 40.0, visible: true, ..text }));
        assert!(buf.pixels().any(|p| p.0[0] > 0));
    }

    #[test]
    fn test_measured_width_tracks_content() {
        let book = FontBook::bundled();
        let short = TextOverlay { content: "ab".into(), font_size: 30.0, ..TextOverlay::default() };
        let long = TextOverlay { content: "abab".into(), ..short.clone() };
        let (w1, w2) = (book.text_width(&short), book.text_width(&long));
        assert!(w1 > 0.0);
        assert!((w2 - 2.0 * w1).abs() < 2.0, "{} vs {}", w1, w2);
    }

    #[test]
    fn test_invalid_font_bytes_rejected() {
        let mut book = FontBook::empty();
        assert!(matches!(book.add_font_bytes("Broken", vec![0, 1, 2, 3]), Err(EditorError::FontLoad(_))));
        assert!(book.families().is_empty());
    }

    #[test]
    fn test_blend_over_opaque_and_transparent() {
        let mut px = Rgba([0, 0, 0, 255]);
        blend_over(&mut px, RgbaColor::WHITE, 1.0);
        assert_eq!(px.0, [255, 255, 255, 255]);

        let mut px = Rgba([10, 20, 30, 255]);
        blend_over(&mut px, RgbaColor::WHITE, 0.0);
        assert_eq!(px.0, [10, 20, 30, 255]);

        let mut px = Rgba([0, 0, 0, 0]);
        blend_over(&mut px, RgbaColor { r: 200, g: 100, b: 50, a: 255 }, 0.5);
        assert_eq!(px.0, [200, 100, 50, 128]);
    }
}
