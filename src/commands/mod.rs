pub mod classifier;
pub mod payload;
