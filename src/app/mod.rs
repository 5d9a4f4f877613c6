use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{self, Context, vec2};
use paynet_explorer::metrics::{MetricsSnapshot, NetworkCatalog, NetworkGraph};
use paynet_explorer::pipeline::{CycleState, PipelineMessage, PollConfig};
use paynet_explorer::visual::{GraphScene, Picked};

mod graph;
mod render_utils;
mod ui;
mod worker;

use worker::PollWorker;

#[derive(Clone, Debug)]
pub struct ExplorerConfig {
    pub poll: PollConfig,
    pub echo_node_address: Option<String>,
}

pub struct ExplorerApp {
    config: ExplorerConfig,
    worker: Option<PollWorker>,
    state: AppState,
}

enum AppState {
    Loading {
        last_message: Option<PipelineMessage>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GraphScope {
    AllNetworks,
    CurrentNetwork,
}

struct ViewModel {
    snapshot: Arc<MetricsSnapshot>,
    received_at: Instant,
    catalog: NetworkCatalog,
    scope: GraphScope,
    scene: GraphScene,
    scene_revision: u64,
    last_message: Option<PipelineMessage>,
    cycle_state: CycleState,
    search: String,
    search_cache: Option<SearchCache>,
    address_query: String,
    backend_url: String,
}

struct SearchCache {
    query: String,
    scene_revision: u64,
    hits: Arc<Vec<SearchHit>>,
}

#[derive(Clone)]
struct SearchHit {
    picked: Picked,
    label: String,
}

impl ExplorerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ExplorerConfig) -> Self {
        let (worker, state) = Self::start_worker(&cc.egui_ctx, &config);
        Self {
            config,
            worker,
            state,
        }
    }

    fn start_worker(ctx: &Context, config: &ExplorerConfig) -> (Option<PollWorker>, AppState) {
        match PollWorker::start(config.poll.clone(), ctx.clone()) {
            Ok(worker) => (Some(worker), AppState::Loading { last_message: None }),
            Err(error) => {
                tracing::error!(error = format!("{error:#}"), "poll worker failed to start");
                (None, AppState::Error(format!("{error:#}")))
            }
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut restart = false;

        let (fresh, messages, cycle_state) = match self.worker.as_mut() {
            Some(worker) => (worker.take_fresh(), worker.drain_messages(), worker.state()),
            None => (None, Vec::new(), CycleState::Failed),
        };
        if self.worker.as_ref().is_some_and(|worker| !worker.is_running()) {
            self.worker = None;
            transition = Some(AppState::Error("Background poll worker stopped".to_owned()));
        }

        match &mut self.state {
            AppState::Loading { last_message } => {
                if let Some(message) = messages.into_iter().last() {
                    *last_message = Some(message);
                }
                if let Some(snapshot) = fresh {
                    transition = Some(AppState::Ready(Box::new(ViewModel::new(
                        snapshot,
                        &self.config,
                    ))));
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Waiting for network metrics...");
                        ui.add_space(8.0);
                        ui.spinner();
                        ui.label(format!("Backend: {}", self.config.poll.backend_url));
                        if let Some(message) = last_message {
                            ui.add_space(10.0);
                            ui.colored_label(ui.visuals().warn_fg_color, message.title.as_str());
                            ui.label(message.description.as_str());
                        }
                    });
                });
            }
            AppState::Ready(model) => {
                if let Some(snapshot) = fresh {
                    model.apply_snapshot(snapshot);
                }
                if let Some(message) = messages.into_iter().last() {
                    model.last_message = Some(message);
                }
                model.cycle_state = cycle_state;
                model.show(ctx);
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to start polling the metrics backend");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        restart = true;
                    }
                });
            }
        }

        if restart {
            let (worker, state) = Self::start_worker(ctx, &self.config);
            self.worker = worker;
            transition = Some(state);
        }
        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

impl ViewModel {
    const INITIAL_CANVAS: egui::Vec2 = vec2(800.0, 600.0);

    fn new(snapshot: Arc<MetricsSnapshot>, config: &ExplorerConfig) -> Self {
        let mut scene = GraphScene::new(Self::INITIAL_CANVAS);
        scene.set_echo_node_address(config.echo_node_address.clone());

        let mut model = Self {
            snapshot: Arc::clone(&snapshot),
            received_at: Instant::now(),
            catalog: NetworkCatalog::default(),
            scope: GraphScope::AllNetworks,
            scene,
            scene_revision: 0,
            last_message: None,
            cycle_state: CycleState::Idle,
            search: String::new(),
            search_cache: None,
            address_query: String::new(),
            backend_url: config.poll.backend_url.clone(),
        };
        model.apply_snapshot(snapshot);
        model
    }

    fn apply_snapshot(&mut self, snapshot: Arc<MetricsSnapshot>) {
        self.catalog.update(&snapshot.networks);
        self.snapshot = snapshot;
        self.received_at = Instant::now();
        self.last_message = None;
        self.rebuild_scene();
    }

    fn set_scope(&mut self, scope: GraphScope) {
        if self.scope != scope {
            self.scope = scope;
            self.rebuild_scene();
        }
    }

    fn rebuild_scene(&mut self) {
        let graph = match self.scope {
            GraphScope::AllNetworks => {
                NetworkGraph::combined(self.catalog.networks().iter().map(|view| &view.graph))
            }
            GraphScope::CurrentNetwork => self
                .catalog
                .current()
                .map(|view| view.graph.clone())
                .unwrap_or_default(),
        };
        self.scene.rebuild(&graph);
        self.scene_revision += 1;
        self.search_cache = None;
    }
}
