use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub surface_0: Color32,
    pub surface_1: Color32,
    pub surface_2: Color32,
    pub surface_3: Color32,
    pub accent_primary: Color32,
    pub accent_muted: Color32,
    pub danger: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub border_subtle: Color32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub spacing_16: f32,
    pub radius_8: u8,
    pub radius_12: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            surface_0: Color32::from_rgb(0x12, 0x10, 0x0F),
            surface_1: Color32::from_rgb(0x1A, 0x17, 0x16),
            surface_2: Color32::from_rgb(0x24, 0x20, 0x1E),
            surface_3: Color32::from_rgb(0x2E, 0x29, 0x26),
            accent_primary: Color32::from_rgb(0xD4, 0xAF, 0x37),
            accent_muted: Color32::from_rgb(0xA8, 0x8A, 0x2C),
            danger: Color32::from_rgb(0xEF, 0x44, 0x44),
            text_primary: Color32::from_rgb(0xF2, 0xEE, 0xEA),
            text_muted: Color32::from_rgb(0x9C, 0x94, 0x8E),
            border_subtle: Color32::from_rgba_premultiplied(255, 255, 255, 13),
            spacing_8: 8.0,
            spacing_12: 12.0,
            spacing_16: 16.0,
            radius_8: 8,
            radius_12: 12,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.surface_1;
        visuals.override_text_color = Some(self.text_primary);
        visuals.widgets.noninteractive.bg_fill = self.surface_2;
        visuals.widgets.noninteractive.weak_bg_fill = self.surface_2;
        visuals.widgets.noninteractive.bg_stroke = Stroke::NONE;
        visuals.widgets.inactive.bg_fill = self.surface_2;
        visuals.widgets.inactive.bg_stroke = Stroke::NONE;
        visuals.widgets.hovered.bg_fill = self.surface_3;
        visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, self.border_subtle);
        visuals.widgets.active.bg_fill = self.accent_muted;
        visuals.widgets.active.bg_stroke = Stroke::NONE;
        visuals.selection.bg_fill = self.accent_muted;
        visuals.hyperlink_color = self.accent_primary;
        visuals.window_fill = self.surface_1;
        visuals.window_corner_radius = CornerRadius::same(self.radius_12);
        visuals.extreme_bg_color = self.surface_0;

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(8.0, 8.0);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(18.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(14.0));
        style.text_styles.insert(TextStyle::Monospace, FontId::monospace(13.0));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(12.0));
        ctx.set_style(style);
    }

    fn frame(&self, fill: Color32, stroke: Stroke) -> Frame {
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::same(self.spacing_12 as i8))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(stroke)
    }

    pub fn card_frame(&self) -> Frame {
        self.frame(self.surface_2, Stroke::new(1.0, self.border_subtle))
    }

    pub fn selected_card_frame(&self) -> Frame {
        self.frame(self.surface_3, Stroke::new(2.0, self.accent_primary))
    }

    pub fn user_turn_frame(&self) -> Frame {
        self.frame(self.surface_3, Stroke::NONE)
    }

    pub fn code_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface_0)
            .inner_margin(Margin::same(self.spacing_8 as i8))
            .corner_radius(CornerRadius::same(self.radius_8))
    }

    pub fn composer_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface_2)
            .inner_margin(Margin::symmetric(self.spacing_12 as i8, 10))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::NONE)
    }
}
