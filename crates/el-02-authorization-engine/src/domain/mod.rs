//! Domain layer: order requests and authorizer routing.

pub mod request;
pub mod routing;

pub use request::OrderRequest;
pub use routing::{authorize_capability, route_authorizer};
