//! Data models

pub mod shipment;

pub use shipment::*;
