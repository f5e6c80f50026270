pub mod percentile;
pub mod placement;
pub mod rank;
pub mod validate;
