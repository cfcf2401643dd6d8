pub mod debt;
pub mod irr;
pub mod metrics;
