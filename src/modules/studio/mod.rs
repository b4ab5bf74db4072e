/// Studio state and the application facade
///
/// - Domain: gallery, viewer, product catalog and activity log
/// - Application: `StudioService`, which wires every flow to that state
pub mod application;
pub mod domain;

pub use application::{BatchReport, BatchRequest, StudioService};
pub use domain::{
    ActivityEntry, ActivityLevel, ActivityLog, Gallery, ProductCatalog, Viewer,
    MAX_ACTIVITY_ENTRIES,
};
