//! Repository module for database CRUD operations
//!
//! Provides typed repository implementations for projects, the part catalog
//! and BOM snapshots.

pub mod bom;
pub mod part;
pub mod project;

pub use bom::{BomRepository, SnapshotSummary};
pub use part::PartRepository;
pub use project::ProjectRepository;
