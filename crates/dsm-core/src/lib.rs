#![forbid(unsafe_code)]
//! dsm-core library.
//!
//! Builds reflexive, symmetric relation matrices ("design structure
//! matrices") from declarative relation lists.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums in [`error`]; `anyhow::Result` only
//!   at the config boundary.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod build;
pub mod config;
pub mod error;
pub mod matrix;
pub mod relations;

pub use build::{BuildOptions, BuildReport, build_matrix};
pub use error::{ErrorCode, MatrixError, RelationsError};
pub use matrix::{MAX_SIZE, MatrixSnapshot, RelationMatrix};
pub use relations::RelationList;
