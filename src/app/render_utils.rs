use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2, vec2};
use paynet_explorer::visual::style::BACKGROUND;
use paynet_explorer::visual::tooltip::LINE_HEIGHT;
use paynet_explorer::visual::{InfoBox, Surface};

const INFO_TEXT: Color32 = Color32::from_rgb(33, 33, 33);
const INFO_LABEL: Color32 = Color32::from_rgb(97, 97, 97);
const INFO_FILL: Color32 = Color32::from_rgba_premultiplied(245, 245, 245, 240);
const INFO_BORDER: Color32 = Color32::from_rgb(189, 189, 189);
const INFO_INSET: f32 = 8.0;
const LABEL_COLUMN: f32 = 110.0;

/// Visible layer: scene coordinates are canvas-local, the painter's are
/// screen coordinates.
pub(super) struct PainterSurface<'a> {
    painter: &'a Painter,
    origin: Vec2,
}

impl<'a> PainterSurface<'a> {
    pub(super) fn new(painter: &'a Painter, canvas: Rect) -> Self {
        Self {
            painter,
            origin: canvas.min.to_vec2(),
        }
    }
}

impl Surface for PainterSurface<'_> {
    fn clear(&mut self) {
        self.painter
            .rect_filled(self.painter.clip_rect(), 0.0, BACKGROUND);
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.painter
            .line_segment([from + self.origin, to + self.origin], stroke);
    }

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, outline: Stroke) {
        self.painter
            .circle(center + self.origin, radius, fill, outline);
    }
}

pub(super) fn draw_info_box(painter: &Painter, canvas: Rect, info: &InfoBox) {
    let rect = info.rect.translate(canvas.min.to_vec2());
    painter.rect_filled(rect.expand(1.0), 3.0, INFO_BORDER);
    painter.rect_filled(rect, 3.0, INFO_FILL);

    let mut cursor = rect.min + vec2(INFO_INSET, INFO_INSET);
    for line in &info.lines {
        let font = if line.strong {
            FontId::monospace(12.0)
        } else {
            FontId::proportional(12.0)
        };
        let mut text_x = cursor.x;
        if let Some(label) = line.label {
            painter.text(cursor, Align2::LEFT_TOP, label, FontId::proportional(12.0), INFO_LABEL);
            text_x += LABEL_COLUMN;
        }
        painter.text(
            Pos2::new(text_x, cursor.y),
            Align2::LEFT_TOP,
            line.text.as_str(),
            font,
            INFO_TEXT,
        );
        cursor.y += LINE_HEIGHT;
    }
}

pub(super) fn draw_centered_message(painter: &Painter, canvas: Rect, text: &str, color: Color32) {
    painter.text(
        canvas.center(),
        Align2::CENTER_CENTER,
        text,
        FontId::proportional(15.0),
        color,
    );
}
