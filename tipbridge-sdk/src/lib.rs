//! Wire contracts and HTTP clients for the tip bridge.
//!
//! `objects` holds the fixed payload shapes of the two remote providers
//! (inbound push-socket envelope, outbound tip API, rate source). `client`
//! holds the typed `reqwest` clients and is gated behind the `client` cargo
//! feature so downstream crates that only need the shared types do not pull
//! in an HTTP stack.

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
