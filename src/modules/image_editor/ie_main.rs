use eframe::egui;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use crate::error::{EditorError, Result};
use crate::modules::background::BackgroundTask;
use crate::modules::image_export::{ExportFormat, encode_image, write_export};
use crate::modules::image_import::{LoadedImage, decode_image, read_image_file};
use crate::settings::AppSettings;
use super::ie_crop::commit_crop;
use super::ie_geometry::DisplayRect;
use super::ie_history::{HistoryEntry, HistoryLedger, SourceImage};
use super::ie_interaction::{InteractionController, InteractionOutcome, PointerEvent, Tool, Viewport};
use super::ie_render::render;
use super::ie_state::{EditState, ExportSettings, Filters, TextOverlay};
use super::ie_text::FontBook;

/// One editing session: the current source bitmap, the working edit state,
/// its history and the last successfully rendered frame.
pub struct ImageEditor {
    pub(super) ledger: HistoryLedger,
    pub(super) state: EditState,
    pub(super) source: Option<Arc<SourceImage>>,
    pub(super) image_name: String,
    /// Last good render. Kept on screen when a render fails.
    pub(super) frame: Option<RgbaImage>,
    pub(super) controller: InteractionController,
    pub(super) fonts: FontBook,
    pub(super) font_families: Vec<String>,

    pub(super) reset_filters_on_crop: bool,
    pub(super) default_export: ExportSettings,

    pub(super) loader: BackgroundTask<Result<LoadedImage>>,
    pub(super) exporter: BackgroundTask<Result<PathBuf>>,

    pub(super) texture: Option<egui::TextureHandle>,
    pub(super) texture_dirty: bool,
    pub(super) hex_input: String,
    pub(super) status: Option<String>,
    /// A live edit is waiting for its interaction to end before it is recorded.
    pub(super) pending_commit: bool,
}

impl ImageEditor {
    pub fn new(fonts: FontBook, settings: &AppSettings) -> Self {
        let state = EditState { export: settings.default_export, ..EditState::default() };
        Self {
            ledger: HistoryLedger::with_limit(settings.history_limit),
            hex_input: state.text.color.to_hex(),
            state,
            source: None,
            image_name: String::new(),
            frame: None,
            controller: InteractionController::new(),
            font_families: fonts.families(),
            fonts,
            reset_filters_on_crop: settings.reset_filters_on_crop,
            default_export: settings.default_export,
            loader: BackgroundTask::new(),
            exporter: BackgroundTask::new(),
            texture: None,
            texture_dirty: false,
            status: None,
            pending_commit: false,
        }
    }

    pub fn has_image(&self) -> bool { self.source.is_some() }
    pub fn state(&self) -> &EditState { &self.state }
    pub fn frame(&self) -> Option<&RgbaImage> { self.frame.as_ref() }
    #[cfg(test)]
    pub fn source(&self) -> Option<&Arc<SourceImage>> { self.source.as_ref() }
    pub fn image_name(&self) -> &str { &self.image_name }
    pub fn tool(&self) -> Tool { self.controller.tool() }
    pub fn status(&self) -> Option<&str> { self.status.as_deref() }
    pub fn history_len(&self) -> usize { self.ledger.len() }
    pub fn can_undo(&self) -> bool { self.ledger.can_undo() }
    pub fn can_redo(&self) -> bool { self.ledger.can_redo() }
    pub fn is_busy(&self) -> bool { self.loader.is_pending() || self.exporter.is_pending() }

    pub fn set_status(&mut self, message: impl Into<String>) { self.status = Some(message.into()); }

    /// Picks up edited settings. Fonts are only rediscovered on restart.
    pub fn apply_settings(&mut self, settings: &AppSettings) {
        self.reset_filters_on_crop = settings.reset_filters_on_crop;
        self.default_export = settings.default_export;
        self.ledger.set_limit(settings.history_limit);
    }

    // --- loading ---

    /// Decodes on the calling thread and applies the result.
    #[cfg(test)]
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let loaded: LoadedImage = decode_image(name, bytes)?;
        self.apply_loaded(loaded);
        Ok(())
    }

    /// Decodes on a worker. A later request replaces this one.
    pub fn request_load_path(&mut self, path: PathBuf) {
        log::info!("loading {}", path.display());
        self.loader.spawn(move || read_image_file(&path));
    }

    pub fn request_load_bytes(&mut self, name: String, bytes: Vec<u8>) {
        log::info!("loading dropped image '{}' ({} bytes)", name, bytes.len());
        self.loader.spawn(move || decode_image(&name, &bytes));
    }

    /// Swaps in a decoded image in one step: new source, fresh state, fresh history.
    pub(super) fn apply_loaded(&mut self, loaded: LoadedImage) {
        let source: Arc<SourceImage> = Arc::new(loaded.source);
        let (w, h) = (source.width(), source.height());
        self.state = EditState::for_new_image(w, h, &self.state.text, self.default_export);
        self.ledger.reset();
        self.ledger.commit(source.clone(), self.state.clone());
        self.source = Some(source);
        self.image_name = loaded.name;
        self.controller.set_tool(Tool::Adjust);
        self.frame = None;
        self.status = None;
        self.pending_commit = false;
        self.hex_input = self.state.text.color.to_hex();
        log::info!("loaded '{}' ({}x{})", self.image_name, w, h);
        self.rerender();
    }

    /// Applies finished background work. Returns true when anything changed.
    pub fn poll_tasks(&mut self) -> bool {
        let mut changed: bool = false;
        if let Some(result) = self.loader.poll() {
            changed = true;
            match result {
                Ok(loaded) => self.apply_loaded(loaded),
                Err(e) => {
                    log::warn!("load rejected: {}", e);
                    self.status = Some(e.to_string());
                }
            }
        }
        if let Some(result) = self.exporter.poll() {
            changed = true;
            self.finish_export(result);
        }
        changed
    }

    /// Drops the image and its whole history. Text styling survives for the next load.
    pub fn clear(&mut self) {
        self.loader.cancel();
        self.ledger.reset();
        self.source = None;
        self.frame = None;
        self.texture = None;
        self.texture_dirty = false;
        self.image_name.clear();
        self.controller.set_tool(Tool::Adjust);
        self.state = EditState { text: self.state.text.clone(), export: self.default_export, ..EditState::default() };
        self.status = None;
        self.pending_commit = false;
        log::info!("image cleared");
    }

    // --- state updates ---

    /// Mutates the working state and re-renders. Only `record` updates enter history.
    pub fn update_state(&mut self, update: impl FnOnce(&mut EditState), record: bool) {
        if self.source.is_none() { return; }
        update(&mut self.state);
        self.rerender();
        if record { self.commit_current(); }
    }

    /// Unrecorded update from a continuous control (slider, drag value, colour
    /// picker, text field). Recorded by [`Self::flush_pending`] once the control is let go.
    pub fn edit_live(&mut self, update: impl FnOnce(&mut EditState)) {
        if self.source.is_none() { return; }
        self.update_state(update, false);
        self.pending_commit = true;
    }

    /// Commits a pending live edit once nothing is being dragged or typed into.
    pub fn flush_pending(&mut self, interacting: bool) {
        if self.pending_commit && !interacting { self.commit_current(); }
    }

    /// Records the working state, unless it already matches the current entry.
    pub fn commit_current(&mut self) {
        self.pending_commit = false;
        let Some(source) = self.source.clone() else { return };
        let candidate = HistoryEntry { source, state: self.state.clone() };
        if self.ledger.current().is_some_and(|current| current.same_as(&candidate)) {
            return;
        }
        self.ledger.commit(candidate.source, candidate.state);
    }

    /// A live edit still waiting for release is recorded first, so undo
    /// reverts exactly that edit instead of discarding it.
    pub fn undo(&mut self) -> Result<()> {
        if self.pending_commit { self.commit_current(); }
        let entry: HistoryEntry = self.ledger.undo()?.clone();
        log::debug!("undo to entry {}", self.ledger.cursor());
        self.restore(entry);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        if self.pending_commit { self.commit_current(); }
        let entry: HistoryEntry = self.ledger.redo()?.clone();
        log::debug!("redo to entry {}", self.ledger.cursor());
        self.restore(entry);
        Ok(())
    }

    fn restore(&mut self, entry: HistoryEntry) {
        self.pending_commit = false;
        self.source = Some(entry.source);
        self.state = entry.state;
        self.hex_input = self.state.text.color.to_hex();
        // the buffer may have changed size under a pending crop rectangle
        self.controller.set_tool(self.controller.tool());
        self.rerender();
    }

    /// Re-renders the working state. On failure the previous frame stays.
    pub(super) fn rerender(&mut self) {
        let Some(source) = self.source.clone() else { return };
        if self.state.text.visible {
            self.fonts.ensure_loaded(&self.state.text.font_family);
        }
        match render(&source, &self.state, &self.fonts) {
            Ok(frame) => {
                self.frame = Some(frame);
                self.texture_dirty = true;
            }
            Err(e) => {
                log::warn!("render failed, keeping previous frame: {}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    pub fn rotate_left(&mut self) { self.update_state(|s| s.transform = s.transform.rotated_left(), true); }
    pub fn rotate_right(&mut self) { self.update_state(|s| s.transform = s.transform.rotated_right(), true); }
    pub fn flip_horizontal(&mut self) { self.update_state(|s| s.transform = s.transform.flipped_horizontal(), true); }
    pub fn flip_vertical(&mut self) { self.update_state(|s| s.transform = s.transform.flipped_vertical(), true); }
    pub fn toggle_text(&mut self) { self.update_state(|s| s.text.visible = !s.text.visible, true); }
    pub fn reset_filters(&mut self) { self.update_state(|s| s.filters = Filters::default(), true); }

    pub fn set_text(&mut self, edit: impl FnOnce(&mut TextOverlay), record: bool) {
        self.update_state(|s| edit(&mut s.text), record);
    }

    /// Export settings never re-render and are captured by the next commit.
    pub fn set_export_format(&mut self, format: ExportFormat) { self.state.export.format = format; }
    pub fn set_export_quality(&mut self, quality: f32) { self.state.export = self.state.export.with_quality(quality); }

    // --- pointer & tools ---

    pub fn set_tool(&mut self, tool: Tool) {
        if self.controller.tool() != tool { log::debug!("tool -> {:?}", tool); }
        self.controller.set_tool(tool);
    }

    /// Feeds one pointer event. `display` is where the frame is drawn on screen.
    /// Returns true when a repaint is needed.
    pub fn pointer(&mut self, event: PointerEvent, display: DisplayRect) -> bool {
        let Some(frame) = &self.frame else { return false };
        let viewport = Viewport { display, buffer_width: frame.width(), buffer_height: frame.height() };
        match self.controller.handle(event, &viewport, &self.state.text, &self.fonts) {
            InteractionOutcome::Nothing => false,
            InteractionOutcome::CropChanged(_) => true,
            InteractionOutcome::TextMoved(p) => {
                self.update_state(|s| { s.text.x = p.x; s.text.y = p.y; }, false);
                true
            }
            InteractionOutcome::TextReleased => {
                self.commit_current();
                true
            }
        }
    }

    /// Crops to the pending rectangle. A rectangle with no area cancels the
    /// crop instead; `Ok(false)` reports that nothing was committed.
    pub fn apply_crop(&mut self) -> Result<bool> {
        let Some(rect) = self.controller.take_crop() else { return Ok(false) };
        let frame: &RgbaImage = self.frame.as_ref().ok_or(EditorError::NoImage)?;
        match commit_crop(&mut self.ledger, frame, rect, &self.state, self.reset_filters_on_crop) {
            Ok(entry) => {
                self.controller.set_tool(Tool::Adjust);
                self.restore(entry);
                Ok(true)
            }
            Err(EditorError::DegenerateCrop) => {
                log::debug!("crop rectangle had no area, cancelled");
                self.cancel_crop();
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn cancel_crop(&mut self) {
        self.controller.cancel_crop();
    }

    // --- export ---

    /// Encodes the current frame with the working export settings.
    #[cfg(test)]
    pub fn export_bytes(&self) -> Result<Vec<u8>> {
        let frame: &RgbaImage = self.frame.as_ref().ok_or(EditorError::NoImage)?;
        encode_image(frame, self.state.export.format, self.state.export.quality)
    }

    /// Encodes and writes on a worker; the file is only created once encoding succeeded.
    pub fn request_export(&mut self, path: PathBuf) -> Result<()> {
        let frame: RgbaImage = self.frame.clone().ok_or(EditorError::NoImage)?;
        let ExportSettings { format, quality } = self.state.export;
        log::info!("exporting {} to {}", format.as_str(), path.display());
        self.exporter.spawn(move || {
            let bytes: Vec<u8> = encode_image(&frame, format, quality)?;
            write_export(&path, &bytes)?;
            Ok(path)
        });
        Ok(())
    }

    fn finish_export(&mut self, result: Result<PathBuf>) {
        match result {
            Ok(path) => {
                log::info!("exported {}", path.display());
                self.status = Some(format!("Exported to {}", path.display()));
            }
            Err(e) => {
                log::warn!("export failed: {}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    // --- display ---

    pub(super) fn ensure_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty { return; }
        self.texture_dirty = false;
        let Some(frame) = &self.frame else { return };
        let size: [usize; 2] = [frame.width() as usize, frame.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, frame.as_raw());
        if let Some(texture) = self.texture.as_mut() {
            texture.set(color_image, egui::TextureOptions::LINEAR);
        } else {
            self.texture = Some(ctx.load_texture("pixelperfect_frame", color_image, egui::TextureOptions::LINEAR));
        }
    }
}
