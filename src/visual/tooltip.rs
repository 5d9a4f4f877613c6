//! Geometry and content of the info box drawn next to the selection.

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::metrics::{GraphLink, GraphNode, Token};

pub const BOX_WIDTH: f32 = 320.0;
pub const LINE_HEIGHT: f32 = 15.0;

const NODE_MARGIN: f32 = 10.0;
const NODE_PADDING: f32 = 10.0;
const LINK_MARGIN: f32 = 20.0;
const LINK_PADDING: f32 = 20.0;
const LEFT_INSET: f32 = 10.0;
const MAX_CAPACITY_DIGITS: u32 = 18;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoLine {
    pub label: Option<&'static str>,
    pub text: String,
    pub strong: bool,
}

impl InfoLine {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            label: None,
            text: text.into(),
            strong: false,
        }
    }

    fn strong(text: impl Into<String>) -> Self {
        Self {
            strong: true,
            ..Self::plain(text)
        }
    }

    fn labeled(label: &'static str, text: impl Into<String>) -> Self {
        Self {
            label: Some(label),
            ..Self::plain(text)
        }
    }

    fn blank() -> Self {
        Self::plain(String::new())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InfoBox {
    pub rect: Rect,
    pub lines: Vec<InfoLine>,
}

/// Centers the box horizontally over `[x1, x2]`, moving it back inside the
/// canvas when it would start left of zero or overflow on the right.
pub fn box_x(x1: f32, x2: f32, width: f32, canvas_width: f32) -> f32 {
    let (min, max) = (x1.min(x2), x1.max(x2));
    let x = (max - min) / 2.0 + min - width / 2.0;
    let x = if x < 0.0 {
        LEFT_INSET
    } else if x + width > canvas_width {
        canvas_width - width
    } else {
        x
    };
    clamp_axis(x, width, canvas_width)
}

/// Places the box below `[y1, y2]` when there is more room below than above,
/// otherwise above it.
pub fn box_y(y1: f32, y2: f32, margin: f32, height: f32, canvas_height: f32) -> f32 {
    let (min, max) = (y1.min(y2), y1.max(y2));
    let room_below = canvas_height - max;
    let y = if room_below > min {
        max + margin
    } else {
        min - margin - height
    };
    clamp_axis(y, height, canvas_height)
}

fn clamp_axis(value: f32, size: f32, extent: f32) -> f32 {
    if size >= extent {
        0.0
    } else {
        value.clamp(0.0, extent - size)
    }
}

pub fn node_lines(node: &GraphNode, echo_node_address: Option<&str>) -> Vec<InfoLine> {
    let mut lines = Vec::with_capacity(12);
    if echo_node_address == Some(node.id.as_str()) {
        lines.push(InfoLine::strong("Raiden Echo Node"));
    }

    let status = if node.is_online() { "online" } else { "offline" };
    lines.push(InfoLine::strong(node.id.as_str()));
    lines.push(InfoLine::plain(format!("Status: {status}")));
    lines.push(InfoLine::blank());
    lines.push(InfoLine::strong("Token"));
    lines.push(InfoLine::labeled("Address:", node.token.address.as_str()));
    if !node.token.symbol.is_empty() {
        lines.push(InfoLine::labeled("Symbol:", node.token.symbol.as_str()));
    }
    if !node.token.name.is_empty() {
        lines.push(InfoLine::labeled("Name:", node.token.name.as_str()));
    }
    lines.push(InfoLine::blank());
    lines.push(InfoLine::labeled("Open Channels:", node.open_channels.to_string()));
    lines.push(InfoLine::labeled("Closed Channels:", node.closed_channels.to_string()));
    lines.push(InfoLine::labeled("Settled Channels:", node.settled_channels.to_string()));
    lines
}

pub fn link_lines(link: &GraphLink, token: &Token) -> Vec<InfoLine> {
    let precision = token.decimals.min(MAX_CAPACITY_DIGITS) as usize;
    vec![
        InfoLine::labeled("Source:", link.source_address.as_str()),
        InfoLine::labeled("Target:", link.target_address.as_str()),
        InfoLine::labeled(
            "Channel capacity:",
            format!("{:.precision$} {}", link.capacity, token.symbol),
        ),
    ]
}

pub fn node_box(
    node: &GraphNode,
    position: Pos2,
    neighbor_positions: impl IntoIterator<Item = Pos2>,
    canvas: Vec2,
    echo_node_address: Option<&str>,
) -> InfoBox {
    let lines = node_lines(node, echo_node_address);
    let height = lines.len() as f32 * LINE_HEIGHT + NODE_PADDING;

    let (min_y, max_y) = neighbor_positions
        .into_iter()
        .fold((position.y, position.y), |(min, max), neighbor| {
            (min.min(neighbor.y), max.max(neighbor.y))
        });

    let x = box_x(position.x, position.x, BOX_WIDTH, canvas.x);
    let y = box_y(min_y, max_y, NODE_MARGIN, height, canvas.y);
    InfoBox {
        rect: Rect::from_min_size(pos2(x, y), vec2(BOX_WIDTH, height)),
        lines,
    }
}

pub fn link_box(link: &GraphLink, token: &Token, from: Pos2, to: Pos2, canvas: Vec2) -> InfoBox {
    let lines = link_lines(link, token);
    let height = lines.len() as f32 * LINE_HEIGHT + LINK_PADDING;

    let x = box_x(from.x, to.x, BOX_WIDTH, canvas.x);
    let y = box_y(from.y, to.y, LINK_MARGIN, height, canvas.y);
    InfoBox {
        rect: Rect::from_min_size(pos2(x, y), vec2(BOX_WIDTH, height)),
        lines,
    }
}
