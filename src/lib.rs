pub mod core;
pub mod models;
pub mod access;
pub mod filter;
pub mod metrics;
pub mod view;
pub mod stores;
pub mod feed;
pub mod utils;
