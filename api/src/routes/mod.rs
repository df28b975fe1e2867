//! API route definitions.
//!
//! This module organizes all HTTP routes for the pxgate API server.

mod health;
mod pixie;
mod static_files;

pub use health::health_routes;
pub use pixie::{pixie_routes, PixieRequest, PixieResponse};
pub use static_files::static_routes;
