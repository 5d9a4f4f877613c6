use eframe::egui::{self, RichText, Ui};
use paynet_explorer::metrics::token::format_amount;
use paynet_explorer::util::short_address;
use paynet_explorer::visual::Picked;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        match self.scene.info_box() {
            Some(info) => {
                for line in &info.lines {
                    if line.text.is_empty() && line.label.is_none() {
                        ui.add_space(4.0);
                        continue;
                    }
                    let text = if line.strong {
                        RichText::new(line.text.as_str()).strong()
                    } else {
                        RichText::new(line.text.as_str())
                    };
                    ui.horizontal_wrapped(|ui| {
                        if let Some(label) = line.label {
                            ui.weak(label);
                        }
                        ui.label(text);
                    });
                }
            }
            None => {
                ui.label("Hover a node or channel in the graph.");
            }
        }

        ui.separator();
        ui.label(RichText::new("Open channels").strong());

        let Some(channels) = self.scene.node_channels().cloned() else {
            ui.label("Click a node to list its open channels.");
            return;
        };

        ui.horizontal(|ui| {
            ui.monospace(short_address(&channels.node.id))
                .on_hover_text(channels.node.id.as_str());
            if ui.small_button("Close").clicked() {
                self.scene.close_node_channels();
            }
        });

        if channels.channels.is_empty() {
            ui.label("No open channels in this token network.");
            return;
        }

        let token = &channels.node.token;
        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("node_channels_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, channels.channels.len(), |ui, row_range| {
                for channel in &channels.channels[row_range] {
                    let partner = if channel.source_address == channels.node.id {
                        &channel.target_address
                    } else {
                        &channel.source_address
                    };
                    let label = format!(
                        "{}  {} {}",
                        short_address(partner),
                        format_amount(channel.capacity, token.decimals),
                        token.symbol
                    );
                    if ui.link(label).on_hover_text(partner.as_str()).clicked() {
                        picked = self
                            .scene
                            .links()
                            .iter()
                            .position(|link| link.data.key() == channel.key())
                            .map(Picked::Link);
                    }
                }
            });

        if let Some(picked) = picked {
            self.scene.select(picked);
        }
    }
}
