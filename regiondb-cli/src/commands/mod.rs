pub mod aggregate;
pub mod import;
pub mod stats;
