//! Push connection plumbing: lifecycle states, backoff, endpoints,
//! transports, and environment triggers.

pub mod backoff;
pub mod endpoint;
pub mod http;
pub mod state;
pub mod transport;
pub mod triggers;

pub use backoff::{Backoff, ReconnectPolicy, RetryDecision};
pub use endpoint::StreamEndpoint;
pub use state::ConnectionState;
pub use transport::{EventStream, Transport};
