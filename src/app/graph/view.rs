use eframe::egui::{Align2, Color32, FontId, Sense, Ui, vec2};

use super::super::ViewModel;
use super::super::render_utils::{PainterSurface, draw_centered_message, draw_info_box};

const EMPTY_TEXT: Color32 = Color32::from_gray(90);
const QUERY_ERROR_TEXT: Color32 = Color32::from_rgb(0xD3, 0x2F, 0x2F);

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.scene.resize(rect.size());

        self.handle_graph_pointer(ui, rect, &response);

        if !self.scene.is_settled() {
            self.scene.tick();
            ui.ctx().request_repaint();
        }

        self.scene.draw(&mut PainterSurface::new(&painter, rect));

        if let Some(message) = self.scene.empty_message() {
            draw_centered_message(&painter, rect, message, EMPTY_TEXT);
        } else if let Some(info) = self.scene.info_box() {
            draw_info_box(&painter, rect, &info);
        }

        if let Some(query) = self.scene.query_error() {
            painter.text(
                rect.left_top() + vec2(12.0, 12.0),
                Align2::LEFT_TOP,
                format!("No node for query: {query}"),
                FontId::proportional(13.0),
                QUERY_ERROR_TEXT,
            );
        }
    }
}
