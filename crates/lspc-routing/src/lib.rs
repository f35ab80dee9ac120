//! Routing on top of the LSP: the LSP supplies a route from its node to the
//! payee, this crate splices in the local hop, pays it through the local node
//! and retries around failing edges.

pub mod builder;
pub mod dispatcher;
pub mod error;
pub mod report;

pub use builder::{splice_local_hop, RouteBuilder, RouteQuery};
pub use dispatcher::{failing_edge, PaymentDispatcher, PaymentOutcome, MAX_ROUTE_ATTEMPTS};
pub use error::RoutingError;
pub use report::report_message;
