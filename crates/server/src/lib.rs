pub mod errors;
pub mod metrics;
pub mod negotiation;
pub mod openapi;
pub mod responder;
pub mod routes;
pub mod startup;

pub use startup::{build_app, run};
