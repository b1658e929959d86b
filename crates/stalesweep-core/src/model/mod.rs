/// Data model for a sweep.
///
/// Re-exports the scan-time file snapshot and size formatting helpers.
pub mod file_record;
pub mod size;

pub use file_record::FileRecord;
