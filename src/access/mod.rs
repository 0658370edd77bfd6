pub mod hierarchy;
pub mod permission;
pub mod sections;
