pub mod account;
pub mod job;
pub mod pricing;
pub mod printer;
pub mod quantity;
pub mod role;
