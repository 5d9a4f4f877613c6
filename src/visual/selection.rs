use std::collections::BTreeSet;

use super::scene::{SceneLink, SceneNode};
use super::style::NodeRole;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Picked {
    Node(usize),
    Link(usize),
    None,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Node {
        index: usize,
        /// Nodes one channel away in the same token network.
        neighbors: BTreeSet<usize>,
        /// Links touching the selected node.
        links: BTreeSet<usize>,
    },
    Link {
        index: usize,
    },
}

impl Selection {
    pub fn node(index: usize, nodes: &[SceneNode], links: &[SceneLink]) -> Self {
        let Some(selected) = nodes.get(index) else {
            return Self::None;
        };

        let mut neighbors = BTreeSet::new();
        let mut touching = BTreeSet::new();
        for (link_index, link) in links.iter().enumerate() {
            if link.data.token_address != selected.data.token.address {
                continue;
            }
            if link.data.target_address == selected.data.id {
                neighbors.insert(link.source);
                touching.insert(link_index);
            } else if link.data.source_address == selected.data.id {
                neighbors.insert(link.target);
                touching.insert(link_index);
            }
        }
        neighbors.remove(&index);

        Self::Node {
            index,
            neighbors,
            links: touching,
        }
    }

    pub fn link(index: usize) -> Self {
        Self::Link { index }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn selected_node(&self) -> Option<usize> {
        match self {
            Self::Node { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn selected_link(&self) -> Option<usize> {
        match self {
            Self::Link { index } => Some(*index),
            _ => None,
        }
    }

    pub fn node_role(&self, node: usize) -> NodeRole {
        match self {
            Self::Node { index, .. } if *index == node => NodeRole::Selected,
            Self::Node { neighbors, .. } if neighbors.contains(&node) => NodeRole::Neighbor,
            Self::Node { .. } => NodeRole::Unrelated,
            Self::None | Self::Link { .. } => NodeRole::Plain,
        }
    }

    pub fn link_highlighted(&self, link: usize) -> bool {
        match self {
            Self::Node { links, .. } => links.contains(&link),
            Self::Link { index } => *index == link,
            Self::None => false,
        }
    }
}
