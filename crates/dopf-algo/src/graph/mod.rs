//! Graph algorithms on feeder topology.
//!
//! - **Partitioning**: cut a radial feeder into areas along declared
//!   tie-lines for distributed OPF
//!
//! ```ignore
//! use dopf_algo::graph::partition_network;
//!
//! let partition = partition_network(&network, &adjacency)?;
//! print!("{}", partition.summary());
//! ```

pub mod partition;

pub use partition::{
    partition_network, Area, AreaLink, AreaPartition, AreaSummary, BoundaryLink, LinkSide,
    PartitionError, PartitionSummary,
};
