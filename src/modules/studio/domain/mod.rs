pub mod activity_log;
pub mod gallery;
pub mod products;

pub use activity_log::{ActivityEntry, ActivityLevel, ActivityLog, MAX_ACTIVITY_ENTRIES};
pub use gallery::{Gallery, Viewer};
pub use products::ProductCatalog;
