pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod pman;
pub mod report;
pub mod reverse;
pub mod sort;
pub mod structs;
pub mod utils;
