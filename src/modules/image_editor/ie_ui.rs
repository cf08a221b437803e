use eframe::egui;
use std::path::PathBuf;
use crate::modules::image_export::{ExportFormat, MAX_QUALITY, MIN_QUALITY, QUALITY_PRESETS, export_file_name};
use crate::modules::image_import::IMAGE_EXTENSIONS;
use crate::style::{self, ColorPalette, ThemeMode};
use super::ie_geometry::{DisplayRect, Point, to_buffer_space, to_display_space};
use super::ie_interaction::{Interaction, PointerEvent, Tool, text_hit_test};
use super::ie_main::ImageEditor;
use super::ie_state::{FilterKind, RgbaColor};
use super::ie_text::TextMetrics;

const CHECKER: f32 = 12.0;
const CANVAS_PADDING: f32 = 24.0;

fn to_point(p: egui::Pos2) -> Point { Point::new(p.x, p.y) }
fn to_pos(p: Point) -> egui::Pos2 { egui::pos2(p.x, p.y) }
fn display_rect(r: egui::Rect) -> DisplayRect { DisplayRect::new(r.left(), r.top(), r.width(), r.height()) }

/// Largest rect with the frame's aspect ratio that fits in `area`, never upscaled.
fn fit_rect(area: egui::Rect, width: u32, height: u32) -> egui::Rect {
    let inner: egui::Rect = area.shrink(CANVAS_PADDING);
    let scale: f32 = (inner.width() / width as f32).min(inner.height() / height as f32).min(1.0).max(0.01);
    egui::Rect::from_center_size(area.center(), egui::vec2(width as f32 * scale, height as f32 * scale))
}

impl ImageEditor {
    /// Native open dialog; the chosen file is decoded in the background.
    pub fn open_dialog(&mut self, start_dir: Option<&PathBuf>) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().add_filter("Images", IMAGE_EXTENSIONS);
        if let Some(dir) = start_dir { dialog = dialog.set_directory(dir); }
        let path: PathBuf = dialog.pick_file()?;
        self.request_load_path(path.clone());
        Some(path)
    }

    /// Native save dialog prefilled with the derived export name.
    pub fn export_dialog(&mut self, start_dir: Option<&PathBuf>) {
        if !self.has_image() { return; }
        let format: ExportFormat = self.state.export.format;
        let mut dialog = rfd::FileDialog::new()
            .set_file_name(export_file_name(&self.image_name, format))
            .add_filter(format.as_str(), &[format.extension()]);
        if let Some(dir) = start_dir { dialog = dialog.set_directory(dir); }
        if let Some(path) = dialog.save_file() {
            if let Err(e) = self.request_export(path) {
                log::warn!("export not started: {}", e);
                self.set_status(e.to_string());
            }
        }
    }

    pub fn render_tool_strip(&mut self, ui: &mut egui::Ui, theme: ThemeMode) {
        ui.horizontal(|ui| {
            let tool: Tool = self.tool();
            if style::tool_button(ui, "Adjust", "Adjustments and text (A)", tool == Tool::Adjust, theme).clicked() {
                self.set_tool(Tool::Adjust);
            }
            if style::tool_button(ui, "Crop", "Drag a rectangle on the image (C)", tool == Tool::Crop, theme).clicked() {
                self.set_tool(Tool::Crop);
            }
            ui.separator();
            let enabled: bool = self.has_image();
            if ui.add_enabled(enabled, egui::Button::new("Rotate left")).clicked() { self.rotate_left(); }
            if ui.add_enabled(enabled, egui::Button::new("Rotate right")).clicked() { self.rotate_right(); }
            if ui.add_enabled(enabled, egui::Button::new("Flip H")).on_hover_text("Flip horizontally").clicked() { self.flip_horizontal(); }
            if ui.add_enabled(enabled, egui::Button::new("Flip V")).on_hover_text("Flip vertically").clicked() { self.flip_vertical(); }
        });
    }

    /// Right-hand control column.
    pub fn render_controls(&mut self, ui: &mut egui::Ui, theme: ThemeMode) {
        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            if self.tool() == Tool::Crop { self.crop_section(ui, theme); ui.add_space(8.0); }
            self.adjust_section(ui, theme);
            ui.add_space(8.0);
            self.text_section(ui, theme);
            ui.add_space(8.0);
            self.export_section(ui, theme);
        });
        let interacting: bool = ui.ctx().input(|i| i.pointer.any_down()) || ui.ctx().memory(|m| m.focused().is_some());
        self.flush_pending(interacting);
    }

    fn crop_section(&mut self, ui: &mut egui::Ui, theme: ThemeMode) {
        style::section_frame(theme).show(ui, |ui| {
            style::section_title(ui, "Crop", theme);
            let pending = self.controller.crop().and_then(|r| {
                let frame = self.frame.as_ref()?;
                r.clamped(frame.width(), frame.height())
            });
            match pending {
                Some(r) => ui.label(format!("{} × {} at ({}, {})", r.width, r.height, r.x, r.y)),
                None => ui.label(egui::RichText::new("Drag on the image to select").color(theme.colors().muted)),
            };
            ui.horizontal(|ui| {
                if ui.add_enabled(pending.is_some(), egui::Button::new("Apply (Enter)")).clicked() {
                    self.apply_crop_logged();
                }
                if ui.button("Cancel (Esc)").clicked() { self.cancel_crop(); }
            });
        });
    }

    pub(crate) fn apply_crop_logged(&mut self) {
        if let Err(e) = self.apply_crop() {
            log::warn!("crop failed: {}", e);
            self.set_status(e.to_string());
        }
    }

    fn adjust_section(&mut self, ui: &mut egui::Ui, theme: ThemeMode) {
        style::section_frame(theme).show(ui, |ui| {
            ui.horizontal(|ui| {
                style::section_title(ui, "Adjust", theme);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let touched: bool = !self.state.filters.is_identity();
                    if ui.add_enabled(touched, egui::Button::new("Reset").small()).clicked() { self.reset_filters(); }
                });
            });
            for kind in FilterKind::ORDER {
                let mut value: f32 = self.state.filters.get(kind);
                let step: f64 = if kind == FilterKind::Blur { 0.5 } else { 1.0 };
                let response = ui.add(
                    egui::Slider::new(&mut value, kind.range())
                        .text(kind.label())
                        .suffix(kind.unit())
                        .step_by(step),
                );
                if response.changed() {
                    self.edit_live(|s| s.filters.set(kind, value));
                }
            }
        });
    }

    fn text_section(&mut self, ui: &mut egui::Ui, theme: ThemeMode) {
        style::section_frame(theme).show(ui, |ui| {
            ui.horizontal(|ui| {
                style::section_title(ui, "Text", theme);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label: &str = if self.state.text.visible { "Hide" } else { "Show" };
                    if ui.add_enabled(self.has_image(), egui::Button::new(label).small()).clicked() { self.toggle_text(); }
                });
            });

            let mut content: String = self.state.text.content.clone();
            if ui.add(egui::TextEdit::singleline(&mut content).hint_text("Overlay text")).changed() {
                self.edit_live(|s| s.text.content = content);
            }

            ui.horizontal(|ui| {
                let mut color: egui::Color32 = self.state.text.color.to_egui();
                if ui.color_edit_button_srgba(&mut color).changed() {
                    let picked: RgbaColor = RgbaColor::from_egui(color);
                    self.hex_input = picked.to_hex();
                    self.edit_live(|s| s.text.color = picked);
                }
                let hex = ui.add(egui::TextEdit::singleline(&mut self.hex_input).desired_width(90.0));
                if hex.lost_focus() {
                    match RgbaColor::from_hex(&self.hex_input) {
                        Some(c) => self.set_text(|t| t.color = c, true),
                        None => self.hex_input = self.state.text.color.to_hex(),
                    }
                }
            });

            let mut size: f32 = self.state.text.font_size;
            ui.horizontal(|ui| {
                ui.label("Size");
                if ui.add(egui::DragValue::new(&mut size).range(1.0..=1000.0).speed(0.5).suffix("px")).changed() {
                    self.edit_live(|s| s.text.font_size = size);
                }
            });

            let mut family: String = self.state.text.font_family.clone();
            egui::ComboBox::from_id_salt("text_font_family")
                .selected_text(&family)
                .width(ui.available_width() - 8.0)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut family, "Sans".to_string(), "Sans (default)");
                    for name in &self.font_families {
                        ui.selectable_value(&mut family, name.clone(), name);
                    }
                });
            if family != self.state.text.font_family {
                self.set_text(|t| t.font_family = family, true);
            }

            let (mut x, mut y) = (self.state.text.x, self.state.text.y);
            ui.horizontal(|ui| {
                ui.label("X");
                let dx = ui.add(egui::DragValue::new(&mut x).speed(1.0));
                ui.label("Y");
                let dy = ui.add(egui::DragValue::new(&mut y).speed(1.0));
                if dx.changed() || dy.changed() {
                    self.edit_live(|s| { s.text.x = x; s.text.y = y; });
                }
            });
        });
    }

    fn export_section(&mut self, ui: &mut egui::Ui, theme: ThemeMode) {
        style::section_frame(theme).show(ui, |ui| {
            style::section_title(ui, "Export", theme);
            let mut format: ExportFormat = self.state.export.format;
            egui::ComboBox::from_id_salt("export_format")
                .selected_text(format.as_str())
                .show_ui(ui, |ui| {
                    for f in ExportFormat::all() {
                        ui.selectable_value(&mut format, f, f.as_str());
                    }
                });
            if format != self.state.export.format { self.set_export_format(format); }

            if format.uses_quality() {
                let mut quality: f32 = self.state.export.quality;
                if ui.add(egui::Slider::new(&mut quality, MIN_QUALITY..=MAX_QUALITY).text("Quality").step_by(0.05)).changed() {
                    self.set_export_quality(quality);
                }
                ui.horizontal(|ui| {
                    for (label, preset) in QUALITY_PRESETS {
                        let selected: bool = (self.state.export.quality - preset).abs() < 1e-3;
                        if ui.selectable_label(selected, label).clicked() { self.set_export_quality(preset); }
                    }
                });
            }

            ui.add_space(6.0);
            let label: &str = if self.exporter.is_pending() { "Exporting…" } else { "Export (Ctrl+E)" };
            if style::accent_button(ui, label, self.has_image() && !self.exporter.is_pending()).clicked() {
                self.export_dialog(None);
            }
        });
    }

    /// The image area: drop zone when empty, otherwise the frame with pointer handling.
    pub fn render_canvas(&mut self, ui: &mut egui::Ui, theme: ThemeMode) -> Option<PathBuf> {
        let area: egui::Rect = ui.available_rect_before_wrap();
        let (rect, response) = ui.allocate_exact_size(area.size(), egui::Sense::click_and_drag());
        let painter: egui::Painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, theme.colors().canvas);

        if !self.has_image() {
            return self.drop_zone(ui, rect, theme);
        }

        self.ensure_texture(ui.ctx());
        let Some((fw, fh)) = self.frame.as_ref().map(|f| f.dimensions()) else { return None };
        let img_rect: egui::Rect = fit_rect(rect, fw, fh);
        paint_checker(&painter, img_rect, ui.visuals().dark_mode);
        if let Some(texture) = &self.texture {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(texture.id(), img_rect, uv, egui::Color32::WHITE);
        }
        painter.rect_stroke(img_rect, 0.0, egui::Stroke::new(1.0, theme.colors().border), egui::StrokeKind::Outside);

        let display: DisplayRect = display_rect(img_rect);
        self.feed_pointer(ui, &response, img_rect, display);

        if let Some(crop) = self.controller.crop() {
            let a: egui::Pos2 = to_pos(to_display_space(Point::new(crop.x, crop.y), display, fw, fh));
            let b: egui::Pos2 = to_pos(to_display_space(Point::new(crop.x + crop.width, crop.y + crop.height), display, fw, fh));
            paint_crop_overlay(&painter, img_rect, egui::Rect::from_two_pos(a, b).intersect(img_rect));
        }

        if matches!(self.controller.mode(), Interaction::DraggingText { .. }) {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        } else if self.tool() == Tool::Adjust && self.state.text.visible {
            if let Some(hover) = response.hover_pos() {
                let width: f32 = self.fonts.text_width(&self.state.text);
                let p: Point = to_buffer_space(to_point(hover), display, fw, fh);
                if text_hit_test(&self.state.text, width, p) {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                }
            }
        } else if self.tool() == Tool::Crop && response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }
        None
    }

    fn feed_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, img_rect: egui::Rect, display: DisplayRect) {
        let mut changed: bool = false;
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(origin) = ui.input(|i| i.pointer.press_origin()) {
                changed |= self.pointer(PointerEvent::Down(to_point(origin)), display);
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                let event: PointerEvent = if img_rect.expand(2.0).contains(pos) { PointerEvent::Move(to_point(pos)) } else { PointerEvent::Leave };
                changed |= self.pointer(event, display);
            }
        }
        if response.drag_stopped() {
            changed |= self.pointer(PointerEvent::Up, display);
        }
        if changed { ui.ctx().request_repaint(); }
    }

    fn drop_zone(&mut self, ui: &mut egui::Ui, rect: egui::Rect, theme: ThemeMode) -> Option<PathBuf> {
        let s = theme.colors();
        let zone: egui::Rect = egui::Rect::from_center_size(rect.center(), egui::vec2(360.0, 200.0));
        let hovering_files: bool = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let stroke_color: egui::Color32 = if hovering_files { ColorPalette::VIOLET_500 } else { s.border };
        ui.painter().rect_stroke(zone, 10.0, egui::Stroke::new(1.5, stroke_color), egui::StrokeKind::Inside);

        let mut picked: Option<PathBuf> = None;
        ui.scope_builder(egui::UiBuilder::new().max_rect(zone.shrink(24.0)), |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);
                ui.label(egui::RichText::new("Drop an image here").size(18.0).color(s.text));
                ui.label(egui::RichText::new(IMAGE_EXTENSIONS.join(", ")).size(11.0).color(s.muted));
                ui.add_space(14.0);
                if self.loader.is_pending() {
                    ui.spinner();
                } else if style::accent_button(ui, "Open image… (Ctrl+O)", true).clicked() {
                    picked = self.open_dialog(None);
                }
            });
        });
        picked
    }
}

fn paint_checker(painter: &egui::Painter, rect: egui::Rect, dark: bool) {
    let (c1, c2) = if dark {
        (egui::Color32::from_rgb(40, 40, 40), egui::Color32::from_rgb(55, 55, 55))
    } else {
        (egui::Color32::from_rgb(200, 200, 200), egui::Color32::from_rgb(220, 220, 220))
    };
    painter.rect_filled(rect, 0.0, c1);
    let cols: i32 = (rect.width() / CHECKER).ceil() as i32;
    let rows: i32 = (rect.height() / CHECKER).ceil() as i32;
    for row in 0..rows {
        for col in (row % 2..cols).step_by(2) {
            let min = egui::pos2(rect.min.x + col as f32 * CHECKER, rect.min.y + row as f32 * CHECKER);
            let cell = egui::Rect::from_min_size(min, egui::vec2(CHECKER, CHECKER)).intersect(rect);
            painter.rect_filled(cell, 0.0, c2);
        }
    }
}

/// Dims everything in `image` outside `crop` and outlines the crop.
fn paint_crop_overlay(painter: &egui::Painter, image: egui::Rect, crop: egui::Rect) {
    let shade = egui::Color32::from_black_alpha(120);
    let bands = [
        egui::Rect::from_min_max(image.min, egui::pos2(image.max.x, crop.min.y)),
        egui::Rect::from_min_max(egui::pos2(image.min.x, crop.max.y), image.max),
        egui::Rect::from_min_max(egui::pos2(image.min.x, crop.min.y), egui::pos2(crop.min.x, crop.max.y)),
        egui::Rect::from_min_max(egui::pos2(crop.max.x, crop.min.y), egui::pos2(image.max.x, crop.max.y)),
    ];
    for band in bands.into_iter().filter(|b| b.is_positive()) {
        painter.rect_filled(band, 0.0, shade);
    }
    painter.rect_stroke(crop, 0.0, egui::Stroke::new(1.5, ColorPalette::VIOLET_400), egui::StrokeKind::Outside);
}
