//! Business logic services

mod harvest;

pub use harvest::{HarvestResult, HarvestService};
