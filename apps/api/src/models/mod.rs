pub mod batch;
pub mod profile;
pub mod report;
