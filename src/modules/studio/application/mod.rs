pub mod service;

pub use service::{BatchReport, BatchRequest, StudioService};
