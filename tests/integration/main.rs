//! Integration tests against a local SSE server.

mod helpers;
mod stream_test;
mod transport_test;
