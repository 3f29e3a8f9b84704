//! Custom Resource Definitions consumed by the deployer

mod application;

pub use application::*;
