pub mod service;

pub use service::AdvisoryService;
