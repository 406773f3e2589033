/// Local filesystem traversal and tier discovery.
pub mod fs;

pub use fs::{FileStream, discover_clean_tables, file_size, is_table_file};
