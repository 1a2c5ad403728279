//! # cfdriver-core
//!
//! I/O-free building blocks shared by the Cloud Foundry reconciler:
//! identifiers, JSON flattening, tri-valued patch maps, metadata wire types
//! and the API version gate.

pub mod id;
pub mod metadata;
pub mod normalize;
pub mod patch;
pub mod version;

pub use id::{CompositeId, IdError, compose_id, is_guid, parse_id};
pub use metadata::{Metadata, MetadataKind, MetadataPatch, MetadataRequest};
pub use normalize::{flatten, normalize_into, scalar_to_string};
pub use patch::{PatchMap, PatchValue, diff_maps};
pub use version::{ApiVersion, metadata_available};
