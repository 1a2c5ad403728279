//! # cfdriver-client
//!
//! Cloud Controller access for the reconciler: a buffered raw HTTP client,
//! typed v2 and v3 endpoint wrappers, pagination, job polling and the
//! [`Session`] that ties them together.

pub mod config;
pub mod error;
pub mod jobs;
pub mod model;
pub mod pagination;
pub mod raw;
pub mod session;
pub mod v2;
pub mod v3;

pub use config::{JobSettings, SessionConfig};
pub use error::{ClientError, ErrorCategory};
pub use jobs::{Job, JobState};
pub use pagination::Query;
pub use raw::{RawClient, RawResponse};
pub use session::Session;
pub use v2::{RoleMember, RoleParent, V2Client};
pub use v3::V3Client;
