//! Built-in subproblem solver backends.
//!
//! Each backend wraps an existing solver and exposes it through
//! the `SubproblemSolver` trait.

mod clarabel;

pub use clarabel::ClarabelBackend;
