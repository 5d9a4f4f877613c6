//! Metrics pipeline and channel graph scene behind the `paynet-explorer`
//! desktop app.

pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod util;
pub mod visual;
