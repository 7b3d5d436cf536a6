pub mod common;
pub mod config;
pub mod enhance;

pub use common::EnhanceError;
pub use config::RoutingProfile;
pub use enhance::{apply_routing, apply_routing_with, EnhanceReport, Enhancer};
