pub mod aggregate;
pub mod catalog;
pub mod graph;
pub mod model;
pub mod overall;
pub mod schema;
pub mod snapshot;
pub mod token;

pub use aggregate::{ChannelDeposit, TokenNetworkSummary, aggregate_network};
pub use catalog::NetworkCatalog;
pub use graph::{GraphLink, GraphNode, LinkKey, NetworkGraph, NodeKey, build_network_graph};
pub use model::{AccountChannels, ChannelStatus, Token};
pub use overall::{OverallMetrics, reduce_overall};
pub use snapshot::{MetricsSnapshot, TokenNetworkView, process_snapshot};
pub use token::to_decimal;
