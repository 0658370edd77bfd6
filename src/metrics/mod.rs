pub mod aggregator;
pub mod dashboard;
