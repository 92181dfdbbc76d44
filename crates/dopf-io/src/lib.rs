//! Loaders for feeder cases and area-adjacency declarations.
//!
//! - [`load_csv_case`]: directory of raw CSV tables (node data, branches,
//!   load shape, storage and flexible-load profiles, optional prices)
//! - [`load_json_case`] / [`save_json_case`]: a serialized [`NetworkModel`]
//! - [`load_adjacency`]: TOML or JSON adjacency declaration
//! - [`four_area_feeder`]: the built-in declaration of the four-area test feeder

pub mod areas;
pub mod case;
pub mod csv_case;

pub use areas::{four_area_feeder, load_adjacency, parse_adjacency, AdjacencyFormat};
pub use case::{load_case, load_json_case, save_json_case};
pub use csv_case::{load_csv_case, DEFAULT_PRICE};

pub use dopf_core::NetworkModel;
