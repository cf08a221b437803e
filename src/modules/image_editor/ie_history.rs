//! Linear undo/redo ledger of (source bitmap, edit state) snapshots.

use image::{DynamicImage, RgbaImage};
use std::collections::VecDeque;
use std::sync::Arc;
use crate::error::{EditorError, Result};
use super::ie_state::EditState;

/// A decoded bitmap. Never mutated once built; crops produce a new one.
#[derive(Debug, PartialEq)]
pub struct SourceImage { pixels: RgbaImage }

impl SourceImage {
    pub fn new(pixels: RgbaImage) -> Self { Self { pixels } }
    pub fn from_dynamic(img: DynamicImage) -> Self { Self { pixels: img.into_rgba8() } }

    pub fn width(&self) -> u32 { self.pixels.width() }
    pub fn height(&self) -> u32 { self.pixels.height() }
    pub fn pixels(&self) -> &RgbaImage { &self.pixels }
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub source: Arc<SourceImage>,
    pub state: EditState,
}

impl HistoryEntry {
    pub fn same_as(&self, other: &HistoryEntry) -> bool {
        Arc::ptr_eq(&self.source, &other.source) && self.state == other.state
    }
}

#[derive(Debug, Default)]
pub struct HistoryLedger {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    limit: Option<usize>,
}

impl HistoryLedger {
    /// Oldest entries are evicted once more than `limit` are held.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self { limit: limit.map(|l| l.max(1)), ..Self::default() }
    }

    /// Drops everything after the cursor, appends the snapshot and moves the
    /// cursor onto it. The state is stored by value.
    pub fn commit(&mut self, source: Arc<SourceImage>, state: EditState) -> &HistoryEntry {
        if !self.entries.is_empty() { self.entries.truncate(self.cursor + 1); }
        self.entries.push_back(HistoryEntry { source, state });
        self.cursor = self.entries.len() - 1;
        self.evict_over_limit();
        log::debug!("history commit: {} entries, cursor {}", self.entries.len(), self.cursor);
        &self.entries[self.cursor]
    }

    /// Changing the limit evicts immediately; the cursor keeps pointing at the
    /// same entry unless that entry itself was evicted.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit.map(|l| l.max(1));
        self.evict_over_limit();
    }

    fn evict_over_limit(&mut self) {
        let Some(limit) = self.limit else { return };
        while self.entries.len() > limit {
            self.entries.pop_front();
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    pub fn undo(&mut self) -> Result<&HistoryEntry> {
        if !self.can_undo() { return Err(EditorError::AtBoundary); }
        self.cursor -= 1;
        Ok(&self.entries[self.cursor])
    }

    pub fn redo(&mut self) -> Result<&HistoryEntry> {
        if !self.can_redo() { return Err(EditorError::AtBoundary); }
        self.cursor += 1;
        Ok(&self.entries[self.cursor])
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn current(&self) -> Option<&HistoryEntry> { self.entries.get(self.cursor) }
    pub fn can_undo(&self) -> bool { !self.is_empty() && self.cursor > 0 }
    pub fn can_redo(&self) -> bool { self.cursor + 1 < self.entries.len() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn cursor(&self) -> usize { self.cursor }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::image_editor::ie_state::FilterKind;
    use pretty_assertions::assert_eq;

    fn source(w: u32) -> Arc<SourceImage> { Arc::new(SourceImage::new(RgbaImage::new(w, 1))) }

    fn state(brightness: f32) -> EditState {
        let mut s = EditState::default();
        s.filters.set(FilterKind::Brightness, brightness);
        s
    }

    #[test]
    fn test_empty_ledger_is_at_boundary() {
        let mut ledger = HistoryLedger::default();
        assert!(matches!(ledger.undo(), Err(EditorError::AtBoundary)));
        assert!(matches!(ledger.redo(), Err(EditorError::AtBoundary)));
        assert!(ledger.current().is_none());
    }

    #[test]
    fn test_commit_after_undo_discards_redo_branch() {
        let img = source(4);
        let mut ledger = HistoryLedger::default();
        ledger.commit(img.clone(), state(100.0));
        ledger.commit(img.clone(), state(110.0)); // A
        ledger.commit(img.clone(), state(120.0)); // B
        ledger.undo().unwrap();
        ledger.commit(img.clone(), state(130.0)); // C
        assert!(matches!(ledger.redo(), Err(EditorError::AtBoundary)));
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.current().unwrap().state.filters.brightness, 130.0);
    }

    #[test]
    fn test_undo_then_redo_restores_entry() {
        let (a, b) = (source(2), source(3));
        let mut ledger = HistoryLedger::default();
        ledger.commit(a.clone(), state(100.0));
        ledger.commit(b.clone(), state(150.0));
        let before = ledger.current().unwrap().clone();
        ledger.undo().unwrap();
        let after = ledger.redo().unwrap().clone();
        assert!(before.same_as(&after));
        assert!(Arc::ptr_eq(&after.source, &b));
    }

    #[test]
    fn test_undo_stops_at_first_entry() {
        let img = source(1);
        let mut ledger = HistoryLedger::default();
        ledger.commit(img.clone(), state(100.0));
        ledger.commit(img.clone(), state(90.0));
        assert_eq!(ledger.undo().unwrap().state.filters.brightness, 100.0);
        assert!(matches!(ledger.undo(), Err(EditorError::AtBoundary)));
        assert_eq!(ledger.cursor(), 0);
    }

    #[test]
    fn test_reset_clears() {
        let mut ledger = HistoryLedger::default();
        ledger.commit(source(1), state(100.0));
        ledger.reset();
        assert!(ledger.is_empty());
        assert!(!ledger.can_undo());
        assert!(!ledger.can_redo());
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let img = source(1);
        let mut ledger = HistoryLedger::with_limit(Some(3));
        for b in [100.0, 110.0, 120.0, 130.0, 140.0] { ledger.commit(img.clone(), state(b)); }
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.cursor(), 2);
        ledger.undo().unwrap();
        assert_eq!(ledger.undo().unwrap().state.filters.brightness, 120.0);
        assert!(!ledger.can_undo());
    }

    #[test]
    fn test_lowering_limit_keeps_cursor_on_entry() {
        let img = source(1);
        let mut ledger = HistoryLedger::default();
        for b in [100.0, 110.0, 120.0, 130.0] { ledger.commit(img.clone(), state(b)); }
        ledger.undo().unwrap();
        ledger.set_limit(Some(2));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.current().unwrap().state.filters.brightness, 120.0);
        assert!(ledger.can_redo());
    }
}
