use eframe::egui;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::EditorError;
use crate::modules::image_editor::{FontBook, ImageEditor, Tool};
use crate::modules::image_export::ExportFormat;
use crate::settings::{AppSettings, ThemePreference};
use crate::style::{self, ThemeMode};

pub struct PixelPerfectApp {
    editor: ImageEditor,
    settings: AppSettings,
    theme_mode: ThemeMode,
    show_settings: bool,
}

impl PixelPerfectApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        let theme_mode: ThemeMode = ThemeMode::resolve(settings.theme_preference, &cc.egui_ctx);
        style::apply_theme(&cc.egui_ctx, theme_mode);

        let fonts: FontBook = FontBook::discover(&settings.font_files, &settings.font_dirs);
        let editor: ImageEditor = ImageEditor::new(fonts, &settings);
        Self { editor, settings, theme_mode, show_settings: false }
    }

    fn save_settings(&self) {
        if let Err(e) = self.settings.save() {
            log::warn!("could not save settings: {}", e);
        }
    }

    fn remember_dir(&mut self, path: &Path) {
        let dir: Option<PathBuf> = path.parent().map(Path::to_path_buf);
        if dir.is_some() && dir != self.settings.last_open_dir {
            self.settings.last_open_dir = dir;
            self.save_settings();
        }
    }

    fn open(&mut self) {
        let start: Option<PathBuf> = self.settings.last_open_dir.clone();
        if let Some(path) = self.editor.open_dialog(start.as_ref()) {
            self.remember_dir(&path);
        }
    }

    fn export(&mut self) {
        let start: Option<PathBuf> = self.settings.last_open_dir.clone();
        self.editor.export_dialog(start.as_ref());
    }

    fn undo(&mut self) {
        match self.editor.undo() {
            Ok(()) | Err(EditorError::AtBoundary) => {}
            Err(e) => log::warn!("undo failed: {}", e),
        }
    }

    fn redo(&mut self) {
        match self.editor.redo() {
            Ok(()) | Err(EditorError::AtBoundary) => {}
            Err(e) => log::warn!("redo failed: {}", e),
        }
    }

    /// Only the last dropped file is loaded.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<egui::DroppedFile> = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().last() else { return };
        if let Some(path) = file.path {
            self.remember_dir(&path);
            self.editor.request_load_path(path);
        } else if let Some(bytes) = file.bytes {
            self.editor.request_load_bytes(file.name, bytes.to_vec());
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (mut undo, mut redo, mut open, mut export) = (false, false, false, false);
        // a focused text field keeps Ctrl+Z/Ctrl+Y for its own editing
        let typing: bool = ctx.wants_keyboard_input();
        ctx.input_mut(|i| {
            if !typing {
                // shift variant first, plain Ctrl+Z would also match it
                if i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z) { redo = true; }
                if i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z) { undo = true; }
                if i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y) { redo = true; }
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) { open = true; }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::E) { export = true; }
        });
        if undo { self.undo(); }
        if redo { self.redo(); }
        if open { self.open(); }
        if export { self.export(); }

        if typing || !self.editor.has_image() { return; }
        let (mut crop_tool, mut adjust_tool, mut apply, mut cancel) = (false, false, false, false);
        ctx.input_mut(|i| {
            crop_tool = i.consume_key(egui::Modifiers::NONE, egui::Key::C);
            adjust_tool = i.consume_key(egui::Modifiers::NONE, egui::Key::A);
            apply = i.consume_key(egui::Modifiers::NONE, egui::Key::Enter);
            cancel = i.consume_key(egui::Modifiers::NONE, egui::Key::Escape);
        });
        if crop_tool { self.editor.set_tool(Tool::Crop); }
        if adjust_tool { self.editor.set_tool(Tool::Adjust); }
        if self.editor.tool() == Tool::Crop {
            if apply { self.editor.apply_crop_logged(); }
            if cancel { self.editor.cancel_crop(); }
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open… (Ctrl+O)").clicked() { self.open(); ui.close(); }
                    if ui.add_enabled(self.editor.has_image(), egui::Button::new("Export… (Ctrl+E)")).clicked() {
                        self.export();
                        ui.close();
                    }
                    if ui.add_enabled(self.editor.has_image(), egui::Button::new("Clear image")).clicked() {
                        self.editor.clear();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Settings").clicked() { self.show_settings = true; ui.close(); }
                    ui.separator();
                    if ui.button("Exit").clicked() { ctx.send_viewport_cmd(egui::ViewportCommand::Close); }
                });
                ui.menu_button("Edit", |ui| {
                    if ui.add_enabled(self.editor.can_undo(), egui::Button::new("Undo (Ctrl+Z)")).clicked() { self.undo(); ui.close(); }
                    if ui.add_enabled(self.editor.can_redo(), egui::Button::new("Redo (Ctrl+Y)")).clicked() { self.redo(); ui.close(); }
                    ui.separator();
                    if ui.add_enabled(self.editor.has_image(), egui::Button::new("Reset adjustments")).clicked() {
                        self.editor.reset_filters();
                        ui.close();
                    }
                    let text_label: &str = if self.editor.state().text.visible { "Hide text" } else { "Show text" };
                    if ui.add_enabled(self.editor.has_image(), egui::Button::new(text_label)).clicked() {
                        self.editor.toggle_text();
                        ui.close();
                    }
                });

                ui.separator();
                if ui.add_enabled(self.editor.can_undo(), egui::Button::new("Undo")).clicked() { self.undo(); }
                if ui.add_enabled(self.editor.can_redo(), egui::Button::new("Redo")).clicked() { self.redo(); }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let muted: egui::Color32 = self.theme_mode.colors().muted;
                    if let Some(frame) = self.editor.frame() {
                        ui.label(egui::RichText::new(format!(
                            "{}  ·  {} × {}  ·  {} steps",
                            self.editor.image_name(), frame.width(), frame.height(), self.editor.history_len()
                        )).size(12.0).color(muted));
                    }
                    if let Some(status) = self.editor.status() {
                        ui.label(egui::RichText::new(status).size(12.0).color(style::ColorPalette::AMBER_400));
                    }
                });
            });
            ui.add_space(4.0);
        });
    }

    fn render_settings_modal(&mut self, ctx: &egui::Context) {
        if !self.show_settings { return; }
        let mut open: bool = self.show_settings;
        let mut changed: bool = false;
        let mut preference: ThemePreference = self.settings.theme_preference;
        let muted: egui::Color32 = self.theme_mode.colors().muted;

        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .min_width(380.0)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new("APPEARANCE").size(11.0).color(muted));
                ui.horizontal(|ui| {
                    ui.label("Theme");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.selectable_value(&mut preference, ThemePreference::Dark, "Dark");
                        ui.selectable_value(&mut preference, ThemePreference::Light, "Light");
                        ui.selectable_value(&mut preference, ThemePreference::System, "System");
                    });
                });
                ui.add_space(10.0);

                ui.label(egui::RichText::new("EDITING").size(11.0).color(muted));
                let mut limited: bool = self.settings.history_limit.is_some();
                let mut limit: usize = self.settings.history_limit.unwrap_or(50);
                ui.horizontal(|ui| {
                    changed |= ui.checkbox(&mut limited, "Limit history to").changed();
                    changed |= ui.add_enabled(limited, egui::DragValue::new(&mut limit).range(1..=10_000)).changed();
                    ui.label("steps");
                });
                self.settings.history_limit = limited.then_some(limit);
                changed |= ui.checkbox(&mut self.settings.reset_filters_on_crop, "Reset adjustments after cropping").changed();
                ui.add_space(10.0);

                ui.label(egui::RichText::new("EXPORT DEFAULTS").size(11.0).color(muted));
                ui.horizontal(|ui| {
                    for format in ExportFormat::all() {
                        changed |= ui.selectable_value(&mut self.settings.default_export.format, format, format.as_str()).changed();
                    }
                });
                ui.add_space(10.0);

                ui.label(egui::RichText::new("FONT FOLDERS").size(11.0).color(muted));
                let mut remove: Option<usize> = None;
                for (idx, dir) in self.settings.font_dirs.iter().enumerate() {
                    ui.horizontal(|ui| {
                        ui.label(dir.display().to_string());
                        if ui.small_button("✕").clicked() { remove = Some(idx); }
                    });
                }
                if let Some(idx) = remove {
                    self.settings.font_dirs.remove(idx);
                    changed = true;
                }
                if ui.button("Add folder…").clicked() {
                    if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                        self.settings.font_dirs.push(dir);
                        changed = true;
                    }
                }
                ui.label(egui::RichText::new("Font changes apply after a restart.").size(11.0).color(muted));
            });

        self.show_settings = open;
        if preference != self.settings.theme_preference {
            self.settings.theme_preference = preference;
            self.theme_mode = ThemeMode::resolve(preference, ctx);
            style::apply_theme(ctx, self.theme_mode);
            changed = true;
        }
        if changed {
            self.editor.apply_settings(&self.settings);
            self.save_settings();
        }
    }
}

impl eframe::App for PixelPerfectApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if matches!(self.settings.theme_preference, ThemePreference::System) {
            let system_theme: ThemeMode = ThemeMode::resolve(ThemePreference::System, ctx);
            if self.theme_mode != system_theme {
                self.theme_mode = system_theme;
                style::apply_theme(ctx, self.theme_mode);
            }
        }

        if self.editor.poll_tasks() { ctx.request_repaint(); }
        if self.editor.is_busy() { ctx.request_repaint_after(Duration::from_millis(50)); }

        self.handle_dropped_files(ctx);
        self.handle_shortcuts(ctx);
        self.render_settings_modal(ctx);
        self.top_bar(ctx);

        let theme: ThemeMode = self.theme_mode;
        if self.editor.has_image() {
            egui::SidePanel::right("controls")
                .resizable(true)
                .default_width(300.0)
                .min_width(260.0)
                .show(ctx, |ui| {
                    ui.add_space(6.0);
                    self.editor.render_controls(ui, theme);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.editor.has_image() {
                self.editor.render_tool_strip(ui, theme);
                ui.add_space(4.0);
            }
            if let Some(path) = self.editor.render_canvas(ui, theme) {
                self.remember_dir(&path);
            }
        });
    }
}
