//! # cfdriver-engine
//!
//! Desired-state reconciliation for Cloud Foundry: the declaration model,
//! the metadata, role and application reconcilers, every resource and
//! data-source kind, and the [`Provider`] that drives them.

pub mod data_sources;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod resource;
pub mod resources;
pub mod roles;
pub mod state;
pub mod value;

pub use driver::{DataSourceRequest, Operation, Outcome, Provider, Request, ResourceRequest, Response};
pub use error::{Error, ErrorCategory, Result};
pub use resource::{DataSource, DynDataSource, DynResource, Resource};
pub use state::ResourceData;
pub use value::{AttrValue, Attributes};
