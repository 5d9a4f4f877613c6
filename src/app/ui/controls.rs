use eframe::egui::{self, RichText, Ui};
use paynet_explorer::visual::Picked;

use super::super::{GraphScope, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph");
        ui.add_space(4.0);

        let mut scope = self.scope;
        ui.horizontal(|ui| {
            ui.radio_value(&mut scope, GraphScope::AllNetworks, "All networks");
            ui.radio_value(&mut scope, GraphScope::CurrentNetwork, "Current network");
        });
        self.set_scope(scope);

        let mut show_all = self.scene.show_all_channels();
        if ui
            .checkbox(&mut show_all, "Show closed and settled channels")
            .changed()
        {
            self.scene.set_show_all_channels(show_all);
            self.scene_revision += 1;
            self.search_cache = None;
        }
        ui.label(format!(
            "{} nodes, {} channels drawn",
            self.scene.nodes().len(),
            self.scene.links().len()
        ));

        ui.add_space(8.0);
        ui.label(RichText::new("Find node").strong());
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.address_query)
                    .hint_text("0x address or prefix")
                    .desired_width(220.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
            if (ui.button("Go").clicked() || submitted) && !self.address_query.trim().is_empty() {
                let query = self.address_query.trim().to_owned();
                // A miss is reported on the canvas.
                let _ = self.scene.select_node_by_address(&query);
            }
        });

        ui.add_space(8.0);
        ui.label(RichText::new("Search").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("address, prefix or token symbol")
                .desired_width(f32::INFINITY),
        );

        let hits = self.search_hits();
        if self.search.trim().is_empty() {
            return;
        }
        if hits.is_empty() {
            ui.weak("No matches.");
            return;
        }

        let selected = self.scene.selection().clone();
        egui::ScrollArea::vertical()
            .id_salt("search_hits")
            .max_height(200.0)
            .show(ui, |ui| {
                for hit in hits.iter() {
                    let is_selected = match hit.picked {
                        Picked::Node(index) => {
                            selected.selected_node() == Some(index)
                        }
                        Picked::Link(index) => {
                            selected.selected_link() == Some(index)
                        }
                        Picked::None => false,
                    };
                    if ui
                        .selectable_label(is_selected, RichText::new(hit.label.as_str()).monospace())
                        .clicked()
                    {
                        self.scene.select(hit.picked);
                    }
                }
            });
    }
}
