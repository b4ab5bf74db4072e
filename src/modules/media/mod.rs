/// Image file import and export
pub mod export;
pub mod import;

pub use export::{export_images, export_named, DEFAULT_EXPORT_DELAY};
pub use import::{import_files, ImportFailure, ImportReport};
