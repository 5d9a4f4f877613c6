use eframe::egui::{Color32, Stroke};

use crate::metrics::ChannelStatus;

pub const BACKGROUND: Color32 = Color32::from_rgb(250, 250, 250);
pub const NODE_OUTLINE: Color32 = Color32::WHITE;
pub const HIT_LINK_WIDTH: f32 = 6.0;
pub const HIT_NODE_PADDING: f32 = 1.0;

const NODE_UNRELATED_OPACITY: f32 = 0.6;
const LINK_WIDTH: f32 = 2.0;
const LINK_OPACITY: f32 = 0.3;
const LINK_HIGHLIGHT_WIDTH: f32 = 3.0;
const LINK_HIGHLIGHT_OPACITY: f32 = 1.0;

const MIN_RADIUS: f32 = 5.0;
const RADIUS_GROWTH: f32 = 3.0;

struct NodePalette {
    base: Color32,
    selected: Color32,
    neighbor: Color32,
}

const ONLINE: NodePalette = NodePalette {
    base: Color32::from_rgb(0x00, 0xB3, 0x5C),
    selected: Color32::from_rgb(0x00, 0xE6, 0x76),
    neighbor: Color32::from_rgb(0x00, 0x66, 0x35),
};

const OFFLINE: NodePalette = NodePalette {
    base: Color32::from_rgb(0x3D, 0x51, 0xC3),
    selected: Color32::from_rgb(0x30, 0xD9, 0xE6),
    neighbor: Color32::from_rgb(0x01, 0x1C, 0xB7),
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
    Plain,
    Selected,
    Neighbor,
    Unrelated,
}

pub fn channel_color(status: ChannelStatus) -> Color32 {
    match status {
        ChannelStatus::Opened => Color32::from_rgb(0x4C, 0xAF, 0x50),
        ChannelStatus::Closed => Color32::from_rgb(0xF4, 0x43, 0x36),
        ChannelStatus::Settled => Color32::from_rgb(0x67, 0x3A, 0xB7),
    }
}

pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub fn node_fill(online: bool, role: NodeRole) -> Color32 {
    let palette = if online { &ONLINE } else { &OFFLINE };
    match role {
        NodeRole::Plain => palette.base,
        NodeRole::Selected => palette.selected,
        NodeRole::Neighbor => palette.neighbor,
        NodeRole::Unrelated => with_opacity(palette.base, NODE_UNRELATED_OPACITY),
    }
}

pub fn node_outline() -> Stroke {
    Stroke::new(1.0, NODE_OUTLINE)
}

pub fn link_stroke(status: ChannelStatus, highlighted: bool) -> Stroke {
    let (width, opacity) = if highlighted {
        (LINK_HIGHLIGHT_WIDTH, LINK_HIGHLIGHT_OPACITY)
    } else {
        (LINK_WIDTH, LINK_OPACITY)
    };
    Stroke::new(width, with_opacity(channel_color(status), opacity))
}

/// Maps open channel counts onto radii between 5 and 8.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusScale {
    range: f32,
}

impl RadiusScale {
    pub fn new(max_open_channels: u32) -> Self {
        Self {
            range: max_open_channels.saturating_sub(1).max(1) as f32,
        }
    }

    pub fn radius(self, open_channels: u32) -> f32 {
        if open_channels == 0 {
            MIN_RADIUS
        } else {
            (open_channels - 1) as f32 * RADIUS_GROWTH / self.range + MIN_RADIUS
        }
    }
}

impl Default for RadiusScale {
    fn default() -> Self {
        Self::new(0)
    }
}
