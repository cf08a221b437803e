use eframe::egui;
use crate::settings::ThemePreference;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    /// Resolves a stored preference against what the OS currently reports.
    pub fn resolve(preference: ThemePreference, ctx: &egui::Context) -> Self {
        match preference {
            ThemePreference::Light => ThemeMode::Light,
            ThemePreference::Dark => ThemeMode::Dark,
            ThemePreference::System => match ctx.theme() {
                egui::Theme::Dark => ThemeMode::Dark,
                egui::Theme::Light => ThemeMode::Light,
            },
        }
    }

    pub fn colors(self) -> Surface {
        match self {
            ThemeMode::Dark => Surface {
                panel: ColorPalette::ZINC_900,
                card: ColorPalette::ZINC_800,
                border: ColorPalette::ZINC_700,
                text: ColorPalette::SLATE_200,
                muted: ColorPalette::ZINC_500,
                canvas: egui::Color32::from_rgb(12, 12, 15),
            },
            ThemeMode::Light => Surface {
                panel: ColorPalette::GRAY_50,
                card: egui::Color32::WHITE,
                border: ColorPalette::GRAY_300,
                text: ColorPalette::GRAY_800,
                muted: ColorPalette::GRAY_500,
                canvas: ColorPalette::GRAY_200,
            },
        }
    }
}

/// The handful of colours panels are drawn with, per theme.
#[derive(Debug, Clone, Copy)]
pub struct Surface {
    pub panel: egui::Color32,
    pub card: egui::Color32,
    pub border: egui::Color32,
    pub text: egui::Color32,
    pub muted: egui::Color32,
    pub canvas: egui::Color32,
}

pub struct ColorPalette;

impl ColorPalette {
    pub const VIOLET_400: egui::Color32 = egui::Color32::from_rgb(167, 139, 250);
    pub const VIOLET_500: egui::Color32 = egui::Color32::from_rgb(139, 92, 246);
    pub const VIOLET_600: egui::Color32 = egui::Color32::from_rgb(124, 58, 237);

    pub const SLATE_100: egui::Color32 = egui::Color32::from_rgb(241, 245, 249);
    pub const SLATE_200: egui::Color32 = egui::Color32::from_rgb(226, 232, 240);
    pub const SLATE_300: egui::Color32 = egui::Color32::from_rgb(203, 213, 225);

    pub const GRAY_50: egui::Color32 = egui::Color32::from_rgb(249, 250, 251);
    pub const GRAY_100: egui::Color32 = egui::Color32::from_rgb(243, 244, 246);
    pub const GRAY_200: egui::Color32 = egui::Color32::from_rgb(229, 231, 235);
    pub const GRAY_300: egui::Color32 = egui::Color32::from_rgb(209, 213, 219);
    pub const GRAY_400: egui::Color32 = egui::Color32::from_rgb(156, 163, 175);
    pub const GRAY_500: egui::Color32 = egui::Color32::from_rgb(107, 114, 128);
    pub const GRAY_700: egui::Color32 = egui::Color32::from_rgb(55, 65, 81);
    pub const GRAY_800: egui::Color32 = egui::Color32::from_rgb(31, 41, 55);

    pub const ZINC_400: egui::Color32 = egui::Color32::from_rgb(161, 161, 170);
    pub const ZINC_500: egui::Color32 = egui::Color32::from_rgb(113, 113, 122);
    pub const ZINC_600: egui::Color32 = egui::Color32::from_rgb(82, 82, 91);
    pub const ZINC_700: egui::Color32 = egui::Color32::from_rgb(63, 63, 70);
    pub const ZINC_800: egui::Color32 = egui::Color32::from_rgb(39, 39, 42);
    pub const ZINC_900: egui::Color32 = egui::Color32::from_rgb(24, 24, 27);

    pub const AMBER_400: egui::Color32 = egui::Color32::from_rgb(251, 191, 36);
}

fn paint_widget(w: &mut egui::style::WidgetVisuals, fill: egui::Color32, stroke: egui::Color32, fg: egui::Color32) {
    w.bg_fill = fill;
    w.weak_bg_fill = fill;
    w.bg_stroke = egui::Stroke::new(1.0, stroke);
    w.fg_stroke = egui::Stroke::new(1.0, fg);
}

pub fn apply_theme(ctx: &egui::Context, theme: ThemeMode) {
    let mut style: egui::Style = (*ctx.style()).clone();
    let s: Surface = theme.colors();

    for w in [
        &mut style.visuals.widgets.noninteractive,
        &mut style.visuals.widgets.inactive,
        &mut style.visuals.widgets.hovered,
        &mut style.visuals.widgets.active,
    ] {
        w.corner_radius = egui::CornerRadius::same(4);
    }
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 5.0);
    style.spacing.slider_width = 150.0;

    let v = &mut style.visuals;
    v.dark_mode = matches!(theme, ThemeMode::Dark);
    v.panel_fill = s.panel;
    v.window_fill = s.panel;
    v.faint_bg_color = s.card;
    v.extreme_bg_color = s.canvas;
    match theme {
        ThemeMode::Dark => {
            paint_widget(&mut v.widgets.noninteractive, ColorPalette::ZINC_800, ColorPalette::ZINC_700, ColorPalette::SLATE_300);
            paint_widget(&mut v.widgets.inactive, egui::Color32::from_rgb(30, 30, 35), ColorPalette::ZINC_600, ColorPalette::SLATE_200);
            paint_widget(&mut v.widgets.hovered, egui::Color32::from_rgb(40, 40, 48), ColorPalette::ZINC_500, ColorPalette::SLATE_100);
            paint_widget(&mut v.widgets.active, egui::Color32::from_rgb(50, 50, 60), ColorPalette::ZINC_400, egui::Color32::WHITE);
            v.selection.bg_fill = egui::Color32::from_rgba_premultiplied(110, 70, 220, 110);
        }
        ThemeMode::Light => {
            paint_widget(&mut v.widgets.noninteractive, egui::Color32::WHITE, ColorPalette::GRAY_300, ColorPalette::GRAY_700);
            paint_widget(&mut v.widgets.inactive, ColorPalette::GRAY_100, ColorPalette::GRAY_300, ColorPalette::GRAY_800);
            paint_widget(&mut v.widgets.hovered, ColorPalette::GRAY_200, ColorPalette::GRAY_400, egui::Color32::BLACK);
            paint_widget(&mut v.widgets.active, ColorPalette::GRAY_300, ColorPalette::GRAY_500, egui::Color32::BLACK);
            v.selection.bg_fill = egui::Color32::from_rgba_premultiplied(110, 70, 220, 70);
        }
    }
    v.selection.stroke = egui::Stroke::new(1.0, ColorPalette::VIOLET_600);
    v.hyperlink_color = ColorPalette::VIOLET_500;

    ctx.set_style(style);
}

/// Filled accent button used for the main action of a panel.
pub fn accent_button(ui: &mut egui::Ui, text: &str, enabled: bool) -> egui::Response {
    ui.scope(|ui| {
        let visuals = &mut ui.style_mut().visuals.widgets;
        paint_widget(&mut visuals.inactive, ColorPalette::VIOLET_600, ColorPalette::VIOLET_600, egui::Color32::WHITE);
        paint_widget(&mut visuals.hovered, ColorPalette::VIOLET_500, ColorPalette::VIOLET_500, egui::Color32::WHITE);
        paint_widget(&mut visuals.active, ColorPalette::VIOLET_600, ColorPalette::VIOLET_400, egui::Color32::WHITE);
        ui.add_enabled(enabled, egui::Button::new(egui::RichText::new(text).strong()).min_size(egui::vec2(ui.available_width(), 32.0)))
    }).inner
}

/// Toggle-style button for the tool strip; `active` draws it in the accent colour.
pub fn tool_button(ui: &mut egui::Ui, label: &str, hint: &str, active: bool, theme: ThemeMode) -> egui::Response {
    let s: Surface = theme.colors();
    let (fill, fg) = if active { (ColorPalette::VIOLET_600, egui::Color32::WHITE) } else { (egui::Color32::TRANSPARENT, s.text) };
    ui.add(
        egui::Button::new(egui::RichText::new(label).size(13.0).color(fg))
            .fill(fill)
            .stroke(egui::Stroke::new(1.0, if active { ColorPalette::VIOLET_600 } else { s.border }))
            .corner_radius(4.0)
            .min_size(egui::vec2(64.0, 26.0)),
    ).on_hover_text(hint)
}

/// Bordered card for a group of controls.
pub fn section_frame(theme: ThemeMode) -> egui::Frame {
    let s: Surface = theme.colors();
    egui::Frame::new()
        .fill(s.card)
        .stroke(egui::Stroke::new(1.0, s.border))
        .corner_radius(6.0)
        .inner_margin(egui::Margin::same(10))
}

pub fn section_title(ui: &mut egui::Ui, title: &str, theme: ThemeMode) {
    ui.label(egui::RichText::new(title.to_uppercase()).size(11.0).color(theme.colors().muted));
}
