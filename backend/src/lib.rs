//! Mindmetric backend library modules.
//!
//! Cognitive-testing web service: browser games submit scores, the backend
//! keeps per-user brain-age estimates, aggregates statistics, and runs a
//! wallet with a gateway-backed deposit flow and a premium tier.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
