use std::collections::HashSet;
use std::sync::Arc;

use super::model::{ChannelStatus, RawTokenNetwork, Token};
use super::token::to_decimal;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub address: String,
    pub token_address: String,
}

impl NodeKey {
    pub fn new(address: impl Into<String>, token_address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token_address: token_address.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    pub source_address: String,
    pub target_address: String,
    pub token_address: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub token: Arc<Token>,
    pub online: Option<bool>,
    pub open_channels: u32,
    pub closed_channels: u32,
    pub settled_channels: u32,
}

impl GraphNode {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.id.as_str(), self.token.address.as_str())
    }

    pub fn is_online(&self) -> bool {
        self.online.unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
    pub source_address: String,
    pub target_address: String,
    pub token_address: String,
    pub status: ChannelStatus,
    pub capacity: f64,
}

impl GraphLink {
    pub fn key(&self) -> LinkKey {
        LinkKey {
            source_address: self.source_address.clone(),
            target_address: self.target_address.clone(),
            token_address: self.token_address.clone(),
        }
    }

    pub fn source_key(&self) -> NodeKey {
        NodeKey::new(self.source_address.as_str(), self.token_address.as_str())
    }

    pub fn target_key(&self) -> NodeKey {
        NodeKey::new(self.target_address.as_str(), self.token_address.as_str())
    }

    pub fn touches(&self, node: &GraphNode) -> bool {
        self.token_address == node.token.address
            && (self.source_address == node.id || self.target_address == node.id)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl NetworkGraph {
    /// Concatenates per-network graphs; keys never collide across tokens.
    pub fn combined<'a>(graphs: impl IntoIterator<Item = &'a NetworkGraph>) -> Self {
        let mut merged = Self::default();
        for graph in graphs {
            merged.nodes.extend(graph.nodes.iter().cloned());
            merged.links.extend(graph.links.iter().cloned());
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builds one node per reported participant and one link per channel whose
/// endpoints are both known. Channels naming unknown participants are dropped.
pub fn build_network_graph(network: &RawTokenNetwork) -> NetworkGraph {
    let token = Arc::new(network.token.clone());

    let nodes = network
        .nodes
        .iter()
        .map(|(address, counts)| GraphNode {
            id: address.clone(),
            token: Arc::clone(&token),
            online: counts.online,
            open_channels: counts.opened,
            closed_channels: counts.closed,
            settled_channels: counts.settled,
        })
        .collect::<Vec<_>>();

    let known = nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();

    let mut dropped = 0usize;
    let mut links = Vec::with_capacity(network.channels.len());
    for channel in &network.channels {
        if !known.contains(channel.participant1.as_str())
            || !known.contains(channel.participant2.as_str())
        {
            dropped += 1;
            continue;
        }

        links.push(GraphLink {
            source_address: channel.participant1.clone(),
            target_address: channel.participant2.clone(),
            token_address: token.address.clone(),
            status: channel.status,
            capacity: to_decimal(channel.combined_deposit(), token.decimals),
        });
    }

    if dropped > 0 {
        tracing::debug!(
            token = %token.address,
            dropped,
            "skipped channels referencing unknown participants"
        );
    }

    NetworkGraph { nodes, links }
}
