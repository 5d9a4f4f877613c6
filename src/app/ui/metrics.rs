use eframe::egui::{self, Color32, Rect, RichText, Sense, Ui, pos2, vec2};
use paynet_explorer::metrics::token::format_amount;
use paynet_explorer::metrics::{AccountChannels, ChannelStatus, TokenNetworkSummary};
use paynet_explorer::util::short_address;
use paynet_explorer::visual::style::channel_color;

use super::super::{GraphScope, ViewModel};

fn account_rows(ui: &mut Ui, accounts: &[AccountChannels]) {
    if accounts.is_empty() {
        ui.weak("none");
        return;
    }
    for account in accounts {
        ui.horizontal(|ui| {
            ui.monospace(short_address(&account.address))
                .on_hover_text(account.address.as_str());
            ui.label(format!("{} channels", account.channels));
        });
    }
}

fn channel_status_bar(ui: &mut Ui, counts: [(ChannelStatus, usize); 3]) {
    let (rect, _) = ui.allocate_exact_size(vec2(ui.available_width(), 10.0), Sense::hover());
    let total = counts.iter().map(|(_, count)| count).sum::<usize>();
    if total == 0 {
        ui.painter().rect_filled(rect, 2.0, Color32::from_gray(60));
        return;
    }

    let mut left = rect.left();
    for (status, count) in counts {
        let width = rect.width() * count as f32 / total as f32;
        let segment = Rect::from_min_max(pos2(left, rect.top()), pos2(left + width, rect.bottom()));
        ui.painter().rect_filled(segment, 0.0, channel_color(status));
        left += width;
    }
}

fn summary_grid(ui: &mut Ui, summary: &TokenNetworkSummary) {
    let decimals = summary.token.decimals;
    let symbol = summary.token.symbol.as_str();
    egui::Grid::new("network_summary")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            let mut row = |label: &str, value: String| {
                ui.label(label);
                ui.label(value);
                ui.end_row();
            };
            row("Token", summary.token.address.clone());
            row("Registry", summary.address.clone());
            row("Decimals", decimals.to_string());
            row("Open channels", summary.opened_channels.to_string());
            row("Closed channels", summary.closed_channels.to_string());
            row("Settled channels", summary.settled_channels.to_string());
            row("All channels", summary.total_channels().to_string());
            row("Participants", summary.unique_participants.len().to_string());
            row(
                "With open channels",
                summary.participants_with_open_channels.to_string(),
            );
            row(
                "Total deposits",
                format!("{} {symbol}", format_amount(summary.total_deposits, decimals)),
            );
            row(
                "Avg deposit / channel",
                format!(
                    "{} {symbol}",
                    format_amount(summary.average_deposit_per_channel, decimals)
                ),
            );
            row(
                "Avg deposit / participant",
                format!(
                    "{} {symbol}",
                    format_amount(summary.average_deposit_per_participant, decimals)
                ),
            );
            row(
                "Avg channels / participant",
                format!("{:.2}", summary.average_channels_per_participant),
            );
        });
}

impl ViewModel {
    pub(in crate::app) fn draw_overview(&self, ui: &mut Ui) {
        let overall = &self.snapshot.overall;
        ui.heading("Overview");
        ui.add_space(4.0);

        egui::Grid::new("overall_metrics")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                let mut row = |label: &str, value: String| {
                    ui.label(label);
                    ui.label(value);
                    ui.end_row();
                };
                row("Token networks", overall.total_token_networks.to_string());
                row("Open channels", overall.total_open_channels.to_string());
                row("Closed channels", overall.total_closed_channels.to_string());
                row("Settled channels", overall.total_settled_channels.to_string());
                row("Unique accounts", overall.unique_accounts.to_string());
                row(
                    "Avg channels / account",
                    format!("{:.2}", overall.average_channels_per_account),
                );
            });

        ui.add_space(4.0);
        channel_status_bar(
            ui,
            [
                (ChannelStatus::Opened, overall.total_open_channels),
                (ChannelStatus::Closed, overall.total_closed_channels),
                (ChannelStatus::Settled, overall.total_settled_channels),
            ],
        );

        let reported = self.snapshot.reported.num_channels_opened;
        if reported != overall.total_open_channels as u64 {
            ui.weak(format!("The backend reports {reported} open channels."));
        }

        ui.add_space(6.0);
        ui.label(RichText::new("Top accounts by channels").strong());
        account_rows(ui, &overall.top_accounts_by_channels);
    }

    pub(in crate::app) fn draw_networks(&mut self, ui: &mut Ui) {
        ui.heading("Token networks");
        ui.add_space(4.0);

        if self.catalog.is_empty() {
            ui.label("No token network has open channels.");
            return;
        }

        let mut changed = false;
        ui.horizontal(|ui| {
            if ui.button("◀ Previous").clicked() {
                changed |= self.catalog.previous().is_some();
            }
            if ui.button("Next ▶").clicked() {
                changed |= self.catalog.next().is_some();
            }
            ui.label(format!("{} browsable", self.catalog.len()));
        });

        let current = self
            .catalog
            .current()
            .map(|view| view.summary.token.address.clone());
        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("network_list")
            .max_height(180.0)
            .show(ui, |ui| {
                for view in self.catalog.networks() {
                    let token = &view.summary.token;
                    let name = if token.symbol.is_empty() {
                        short_address(&token.address)
                    } else {
                        format!("{} {}", token.symbol, token.name)
                    };
                    let label = format!("{name}  ({} open)", view.summary.opened_channels);
                    let is_current = current.as_deref() == Some(token.address.as_str());
                    if ui.selectable_label(is_current, label).clicked() && !is_current {
                        picked = Some(token.address.clone());
                    }
                }
            });
        if let Some(token_address) = picked {
            changed |= self.catalog.select(&token_address);
        }

        if changed && self.scope == GraphScope::CurrentNetwork {
            self.rebuild_scene();
        }

        let Some(view) = self.catalog.current() else {
            return;
        };
        let summary = &view.summary;

        ui.add_space(6.0);
        channel_status_bar(
            ui,
            [
                (ChannelStatus::Opened, summary.opened_channels),
                (ChannelStatus::Closed, summary.closed_channels),
                (ChannelStatus::Settled, summary.settled_channels),
            ],
        );
        ui.add_space(4.0);
        summary_grid(ui, summary);

        ui.add_space(6.0);
        ui.label(RichText::new("Top channels by deposit").strong());
        if summary.top_channels_by_deposit.is_empty() {
            ui.weak("none");
        }
        for channel in &summary.top_channels_by_deposit {
            ui.horizontal(|ui| {
                ui.monospace(format!("#{}", channel.identifier));
                ui.label(format!(
                    "{} ↔ {}",
                    short_address(&channel.participant1),
                    short_address(&channel.participant2)
                ));
                ui.label(format!(
                    "{} {}",
                    format_amount(channel.capacity(), summary.token.decimals),
                    summary.token.symbol
                ));
            });
        }

        ui.add_space(6.0);
        ui.label(RichText::new("Top participants by channels").strong());
        account_rows(ui, &summary.top_participants_by_channels);
    }
}
