//! # dopf-core: feeder data model
//!
//! Shared data types for distributed optimal power flow on radial
//! distribution feeders:
//!
//! - [`NetworkModel`]: nodes, directed lines, per-period load, storage and
//!   flexible-load resources, price profile
//! - [`AdjacencyDeclaration`]: how the feeder is cut into areas
//! - [`DopfError`]: unified error for loaders and the CLI
//!
//! Time is a finite horizon of periods `1..=T`; every per-node series is a
//! vector of length `T`.
//!
//! ```rust
//! use dopf_core::NetworkModel;
//!
//! let mut net = NetworkModel::new(2);
//! net.add_node(1, &[0.0, 0.0])
//!     .add_node(2, &[10.0, 12.0])
//!     .add_line(1, 2);
//! assert!(net.validate().is_ok());
//! assert_eq!(net.substation_nodes().len(), 1);
//! ```

pub mod areas;
pub mod error;
pub mod network;

pub use areas::{AdjacencyDeclaration, AreaDeclaration, DownstreamLink};
pub use error::{DopfError, DopfResult};
pub use network::{series_value, Line, ModelLimits, NetworkModel, NodeId, StorageParams};
