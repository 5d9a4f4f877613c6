use std::collections::{HashMap, HashSet};

use eframe::egui::{Pos2, Stroke, Vec2};
use tracing::{debug, info, warn};

use super::hit::{HitKey, HitLayer, KeyAllocator};
use super::physics::{ForceConfig, SimLink, SimNode, Simulation, WARM_UP_TICKS};
use super::selection::{Picked, Selection};
use super::style::{HIT_LINK_WIDTH, HIT_NODE_PADDING, RadiusScale, link_stroke, node_fill, node_outline};
use super::surface::Surface;
use super::tooltip::{InfoBox, link_box, node_box};
use crate::error::SceneError;
use crate::metrics::{ChannelStatus, GraphLink, GraphNode, NetworkGraph, NodeKey};
use crate::util::stable_offset;

pub const EMPTY_GRAPH_MESSAGE: &str = "No channels to visualize!";

const REFRESH_ALPHA: f32 = 0.05;
const PARTIAL_ALPHA: f32 = 0.5;
const DRAG_ALPHA_TARGET: f32 = 0.3;
const RESIZE_ALPHA: f32 = 0.3;
const SEED_SPREAD: f32 = 20.0;

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub data: GraphNode,
    pub key: HitKey,
    pub radius: f32,
}

#[derive(Clone, Debug)]
pub struct SceneLink {
    pub data: GraphLink,
    pub key: HitKey,
    pub source: usize,
    pub target: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeChannels {
    pub node: GraphNode,
    pub channels: Vec<GraphLink>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutStart {
    /// No remembered positions; spiral start plus a full warm-up.
    Cold,
    /// Some nodes are new; known ones keep their positions, then a warm-up.
    Partial,
    /// Same node set as before; positions carried over untouched.
    Reused,
}

pub struct GraphScene {
    size: Vec2,
    show_all_channels: bool,
    echo_node_address: Option<String>,
    source: NetworkGraph,
    nodes: Vec<SceneNode>,
    links: Vec<SceneLink>,
    entities: HashMap<HitKey, Picked>,
    simulation: Simulation,
    forces: ForceConfig,
    remembered: HashMap<NodeKey, Vec2>,
    hit: HitLayer,
    hit_dirty: bool,
    hit_redraws: u64,
    selection: Selection,
    node_channels: Option<NodeChannels>,
    query_error: Option<String>,
    dragging: Option<usize>,
}

impl GraphScene {
    pub fn new(size: Vec2) -> Self {
        let forces = ForceConfig::default();
        Self {
            size,
            show_all_channels: false,
            echo_node_address: None,
            source: NetworkGraph::default(),
            nodes: Vec::new(),
            links: Vec::new(),
            entities: HashMap::new(),
            simulation: Simulation::new(Vec::new(), Vec::new(), size * 0.5, forces),
            forces,
            remembered: HashMap::new(),
            hit: HitLayer::new(size),
            hit_dirty: true,
            hit_redraws: 0,
            selection: Selection::None,
            node_channels: None,
            query_error: None,
            dragging: None,
        }
    }

    pub fn set_echo_node_address(&mut self, address: Option<String>) {
        self.echo_node_address = address;
    }

    pub fn show_all_channels(&self) -> bool {
        self.show_all_channels
    }

    pub fn set_show_all_channels(&mut self, show_all: bool) {
        if self.show_all_channels != show_all {
            self.show_all_channels = show_all;
            self.layout();
        }
    }

    /// Replaces the displayed graph. Positions of nodes seen before are kept;
    /// an unchanged graph leaves the scene and its selection untouched.
    pub fn rebuild(&mut self, graph: &NetworkGraph) -> LayoutStart {
        if !self.source.is_empty() && self.source == *graph {
            debug!("graph unchanged, scene kept");
            return LayoutStart::Reused;
        }
        self.source = graph.clone();
        self.layout()
    }

    fn layout(&mut self) -> LayoutStart {
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(position) = self.simulation.position(index) {
                self.remembered.insert(node.data.key(), position);
            }
        }
        let previous = self
            .nodes
            .iter()
            .map(|node| node.data.key())
            .collect::<HashSet<_>>();

        self.selection = Selection::None;
        self.node_channels = None;
        self.query_error = None;
        self.dragging = None;

        let mut visible = self
            .source
            .nodes
            .iter()
            .filter(|node| self.show_all_channels || node.open_channels > 0)
            .cloned()
            .collect::<Vec<_>>();
        // Busy nodes are drawn last, on top.
        visible.sort_by_key(|node| node.open_channels);

        let scale = RadiusScale::new(
            visible
                .iter()
                .map(|node| node.open_channels)
                .max()
                .unwrap_or(0),
        );
        let mut keys = KeyAllocator::default();

        self.nodes = visible
            .into_iter()
            .map_while(|data| {
                Some(SceneNode {
                    radius: scale.radius(data.open_channels),
                    key: keys.next_key()?,
                    data,
                })
            })
            .collect();

        let index_of = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.data.key(), index))
            .collect::<HashMap<_, _>>();

        self.links = self
            .source
            .links
            .iter()
            .filter(|link| self.show_all_channels || link.status == ChannelStatus::Opened)
            .filter_map(|link| {
                let source = *index_of.get(&link.source_key())?;
                let target = *index_of.get(&link.target_key())?;
                Some(SceneLink {
                    data: link.clone(),
                    key: keys.next_key()?,
                    source,
                    target,
                })
            })
            .collect();
        if keys.is_exhausted() {
            warn!(
                nodes = self.nodes.len(),
                links = self.links.len(),
                "hit keys exhausted, remaining entities are not drawn"
            );
        }

        self.entities = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.key, Picked::Node(index)))
            .chain(
                self.links
                    .iter()
                    .enumerate()
                    .map(|(index, link)| (link.key, Picked::Link(index))),
            )
            .collect();

        let current = index_of.into_keys().collect::<HashSet<_>>();
        let start = if !current.is_empty() && current == previous {
            LayoutStart::Reused
        } else if current.iter().any(|key| self.remembered.contains_key(key)) {
            LayoutStart::Partial
        } else {
            LayoutStart::Cold
        };

        let sim_nodes = self.seed_positions();
        let sim_links = self
            .links
            .iter()
            .map(|link| SimLink {
                source: link.source,
                target: link.target,
            })
            .collect();
        self.simulation = Simulation::new(sim_nodes, sim_links, self.center(), self.forces);

        let ticks = match start {
            LayoutStart::Reused => {
                self.simulation.set_alpha(REFRESH_ALPHA);
                0
            }
            LayoutStart::Partial => {
                self.simulation.set_alpha(PARTIAL_ALPHA);
                self.simulation.warm_up(WARM_UP_TICKS)
            }
            LayoutStart::Cold => self.simulation.warm_up(WARM_UP_TICKS),
        };
        self.remembered.retain(|key, _| current.contains(key));
        self.hit_dirty = true;

        info!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            show_all = self.show_all_channels,
            ?start,
            warm_up_ticks = ticks,
            "graph scene rebuilt"
        );
        start
    }

    /// Remembered nodes keep their position; new ones start next to a
    /// remembered neighbor, or on the spiral when they have none.
    fn seed_positions(&self) -> Vec<SimNode> {
        let mut known = self
            .nodes
            .iter()
            .map(|node| self.remembered.get(&node.data.key()).copied())
            .collect::<Vec<_>>();

        for index in 0..self.nodes.len() {
            if known[index].is_some() {
                continue;
            }
            let anchor = self.links.iter().find_map(|link| {
                if link.source == index {
                    self.remembered.get(&self.nodes[link.target].data.key())
                } else if link.target == index {
                    self.remembered.get(&self.nodes[link.source].data.key())
                } else {
                    None
                }
            });
            let data = &self.nodes[index].data;
            known[index] = Some(match anchor {
                Some(anchor) => {
                    let seed = format!("{}{}", data.id, data.token.address);
                    *anchor + stable_offset(&seed) * SEED_SPREAD
                }
                None => Simulation::cold_position(index, self.center()),
            });
        }

        known
            .into_iter()
            .map(|position| SimNode {
                position: position.unwrap_or_default(),
                ..SimNode::default()
            })
            .collect()
    }

    fn center(&self) -> Vec2 {
        self.size * 0.5
    }

    pub fn tick(&mut self) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let hot = self.simulation.tick();
        self.hit_dirty = true;
        hot
    }

    pub fn is_settled(&self) -> bool {
        self.simulation.is_cooled() && self.dragging.is_none()
    }

    pub fn resize(&mut self, size: Vec2) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.hit.resize(size);
        self.hit_dirty = true;
        self.simulation.set_center(self.center());
        self.simulation.reheat(RESIZE_ALPHA);
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn draw<S: Surface>(&self, surface: &mut S) {
        surface.clear();
        for (index, link) in self.links.iter().enumerate() {
            surface.line(
                self.point(link.source),
                self.point(link.target),
                link_stroke(link.data.status, self.selection.link_highlighted(index)),
            );
        }
        for (index, node) in self.nodes.iter().enumerate() {
            let role = self.selection.node_role(index);
            surface.circle(
                self.point(index),
                node.radius,
                node_fill(node.data.is_online(), role),
                node_outline(),
            );
        }
    }

    fn redraw_hit_layer(&mut self) {
        if !self.hit_dirty {
            return;
        }
        let Self {
            hit,
            nodes,
            links,
            simulation,
            ..
        } = self;
        let point = |index: usize| simulation.position(index).unwrap_or_default().to_pos2();

        hit.clear();
        for link in links.iter() {
            hit.line(
                point(link.source),
                point(link.target),
                Stroke::new(HIT_LINK_WIDTH, link.key.color()),
            );
        }
        for (index, node) in nodes.iter().enumerate() {
            hit.circle(
                point(index),
                node.radius + HIT_NODE_PADDING,
                node.key.color(),
                Stroke::NONE,
            );
        }

        self.hit_dirty = false;
        self.hit_redraws += 1;
    }

    pub fn pick(&mut self, point: Pos2) -> Picked {
        self.redraw_hit_layer();
        self.hit
            .key_at(point)
            .and_then(|key| self.entities.get(&key).copied())
            .unwrap_or(Picked::None)
    }

    /// Hover: selects whatever is under the pointer, keeps the selection on a
    /// miss.
    pub fn pointer_moved(&mut self, point: Pos2) -> Picked {
        let picked = self.pick(point);
        match picked {
            Picked::Node(index) => self.select_node(index),
            Picked::Link(index) => self.select_link(index),
            Picked::None => {}
        }
        picked
    }

    /// Pressing on empty canvas drops the selection and the channel list.
    pub fn pointer_pressed(&mut self, point: Pos2) -> Picked {
        let picked = self.pick(point);
        if picked == Picked::None {
            self.select(Picked::None);
        }
        picked
    }

    pub fn select_at(&mut self, point: Pos2) -> Picked {
        let picked = self.pick(point);
        self.select(picked);
        picked
    }

    /// Nodes also open their channel list; `None` clears everything.
    pub fn select(&mut self, picked: Picked) {
        match picked {
            Picked::Node(index) => {
                self.select_node(index);
                self.node_channels = self.channels_of(index);
            }
            Picked::Link(index) => self.select_link(index),
            Picked::None => {
                self.clear_selection();
                self.node_channels = None;
            }
        }
    }

    fn select_node(&mut self, index: usize) {
        self.clear_selection();
        self.selection = Selection::node(index, &self.nodes, &self.links);
    }

    fn select_link(&mut self, index: usize) {
        self.clear_selection();
        if index < self.links.len() {
            self.selection = Selection::link(index);
        }
    }

    /// Drops the highlight and any query error; the channel list stays open.
    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
        self.query_error = None;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    fn channels_of(&self, index: usize) -> Option<NodeChannels> {
        let node = &self.nodes.get(index)?.data;
        let channels = self
            .links
            .iter()
            .filter(|link| link.data.status == ChannelStatus::Opened && link.data.touches(node))
            .map(|link| link.data.clone())
            .collect();
        Some(NodeChannels {
            node: node.clone(),
            channels,
        })
    }

    pub fn node_channels(&self) -> Option<&NodeChannels> {
        self.node_channels.as_ref()
    }

    pub fn close_node_channels(&mut self) {
        self.node_channels = None;
    }

    pub fn drag_start(&mut self, point: Pos2) -> bool {
        let Picked::Node(index) = self.pick(point) else {
            return false;
        };
        self.dragging = Some(index);
        self.simulation.pin(index, point.to_vec2());
        self.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        self.simulation.reheat(DRAG_ALPHA_TARGET);
        true
    }

    pub fn drag_to(&mut self, point: Pos2) {
        if let Some(index) = self.dragging {
            self.simulation.pin(index, point.to_vec2());
            self.hit_dirty = true;
        }
    }

    pub fn drag_end(&mut self) {
        if let Some(index) = self.dragging.take() {
            self.simulation.release(index);
            self.simulation.set_alpha_target(0.0);
        }
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Nodes whose address starts with `query`, then links with an endpoint
    /// that does. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<Picked> {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.data.id.starts_with(query))
            .map(|(index, _)| Picked::Node(index));
        let links = self
            .links
            .iter()
            .enumerate()
            .filter(|(_, link)| {
                link.data.source_address.starts_with(query)
                    || link.data.target_address.starts_with(query)
            })
            .map(|(index, _)| Picked::Link(index));
        nodes.chain(links).collect()
    }

    /// Selects the single node matching `query`. Zero or several matches
    /// leave the selection cleared and record the query as an error.
    pub fn select_node_by_address(&mut self, query: &str) -> Result<usize, SceneError> {
        let mut matches = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.data.id.starts_with(query))
            .map(|(index, _)| index);

        if let (Some(index), None) = (matches.next(), matches.next()) {
            self.select(Picked::Node(index));
            debug!(query, index, "node selected by address");
            return Ok(index);
        }

        self.select(Picked::None);
        self.query_error = Some(query.to_owned());
        warn!(query, "no unique node for query");
        Err(SceneError::NoNodeForQuery(query.to_owned()))
    }

    pub fn query_error(&self) -> Option<&str> {
        self.query_error.as_deref()
    }

    pub fn info_box(&self) -> Option<InfoBox> {
        match &self.selection {
            Selection::Node {
                index, neighbors, ..
            } => {
                let node = self.nodes.get(*index)?;
                Some(node_box(
                    &node.data,
                    self.point(*index),
                    neighbors.iter().map(|&neighbor| self.point(neighbor)),
                    self.size,
                    self.echo_node_address.as_deref(),
                ))
            }
            Selection::Link { index } => {
                let link = self.links.get(*index)?;
                let token = &self.nodes.get(link.source)?.data.token;
                Some(link_box(
                    &link.data,
                    token,
                    self.point(link.source),
                    self.point(link.target),
                    self.size,
                ))
            }
            Selection::None => None,
        }
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        self.nodes.is_empty().then_some(EMPTY_GRAPH_MESSAGE)
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SceneLink] {
        &self.links
    }

    pub fn node_position(&self, index: usize) -> Option<Pos2> {
        self.simulation.position(index).map(Vec2::to_pos2)
    }

    fn point(&self, index: usize) -> Pos2 {
        self.node_position(index).unwrap_or_default()
    }
}
