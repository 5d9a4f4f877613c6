use eframe::egui::{self, PointerButton, Pos2, Rect, Ui};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let local = |position: Pos2| (position - rect.min).to_pos2();

        if response.drag_started_by(PointerButton::Primary)
            && let Some(origin) = ui.input(|input| input.pointer.press_origin())
        {
            self.scene.drag_start(local(origin));
        }

        if self.scene.dragging().is_some() {
            if ui.input(|input| input.pointer.primary_down()) {
                if let Some(position) = response.interact_pointer_pos() {
                    self.scene.drag_to(local(position));
                }
            } else {
                self.scene.drag_end();
            }
            return;
        }

        if response.hovered()
            && ui.input(|input| input.pointer.primary_pressed())
            && let Some(position) = ui.input(|input| input.pointer.interact_pos())
        {
            self.scene.pointer_pressed(local(position));
        }

        if response.clicked()
            && let Some(position) = response.interact_pointer_pos()
        {
            self.scene.select_at(local(position));
        } else if let Some(position) = response.hover_pos()
            && ui.input(|input| input.pointer.is_moving())
        {
            self.scene.pointer_moved(local(position));
        }
    }
}
