pub mod fixtures;
pub mod records;
