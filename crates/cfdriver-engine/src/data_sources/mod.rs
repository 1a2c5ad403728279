//! Read-only lookups of existing entities.
//!
//! Every lookup fails with [`Error::NotFound`](crate::Error::NotFound) when
//! nothing matches and silently takes the first hit when several do.

use std::sync::Arc;

use crate::resource::DynDataSource;

pub mod app;
pub mod platform;
pub mod services;
pub mod tenancy;

/// Every data-source kind the driver serves.
pub fn all() -> Vec<DynDataSource> {
    vec![
        Arc::new(tenancy::OrgData),
        Arc::new(tenancy::SpaceData),
        Arc::new(app::AppData),
        Arc::new(platform::StackData),
        Arc::new(platform::IsolationSegmentData),
        Arc::new(services::ServiceData),
        Arc::new(services::ServiceInstanceData),
        Arc::new(services::UserProvidedServiceData),
        Arc::new(services::ServiceKeyData),
    ]
}
