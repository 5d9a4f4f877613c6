use std::time::Duration;

use eframe::egui::{self, Align, Context, Layout, RichText};
use paynet_explorer::pipeline::CycleState;

use super::super::ViewModel;

fn cycle_state_text(state: CycleState) -> String {
    match state {
        CycleState::Idle => "idle".to_owned(),
        CycleState::Fetching { attempt: 0 } => "fetching".to_owned(),
        CycleState::Fetching { attempt } => format!("fetching (retry {attempt})"),
        CycleState::Retrying { attempt } => format!("waiting to retry ({attempt})"),
        CycleState::Validating => "validating".to_owned(),
        CycleState::Aggregating => "aggregating".to_owned(),
        CycleState::Emitting => "publishing".to_owned(),
        CycleState::Failed => "last cycle failed".to_owned(),
    }
}

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        // Keeps the "updated ... ago" label and the poll state current.
        ctx.request_repaint_after(Duration::from_secs(1));

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("paynet-explorer");
                    ui.separator();
                    ui.label(format!("backend: {}", self.backend_url));
                    ui.label(format!(
                        "networks: {}",
                        self.snapshot.overall.total_token_networks
                    ));
                    ui.label(format!(
                        "open channels: {}",
                        self.snapshot.overall.total_open_channels
                    ));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(cycle_state_text(self.cycle_state));
                        ui.label(format!(
                            "updated {}s ago",
                            self.received_at.elapsed().as_secs()
                        ));
                    });
                });
            });

        if let Some(message) = self.last_message.clone() {
            egui::TopBottomPanel::top("pipeline_message")
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(message.title.as_str())
                                .strong()
                                .color(ui.visuals().error_fg_color),
                        );
                        ui.label(message.description.as_str());
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui.small_button("Dismiss").clicked() {
                                self.last_message = None;
                            }
                        });
                    });
                });
        }

        egui::SidePanel::left("metrics")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("metrics_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.draw_overview(ui);
                        ui.separator();
                        self.draw_networks(ui);
                    });
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| {
                self.draw_controls(ui);
                ui.separator();
                self.draw_details(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }
}
