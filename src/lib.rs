//! Builds Kubernetes API clients from layered key/value configuration.
//!
//! Credentials (OAuth tokens, client certificates, CA certificates and
//! trust-stores) are looked up under a caller supplied key prefix, validated
//! for mutually exclusive alternatives, and handed to the transport.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod kubernetes;
pub mod tls;

pub use config::{ConfigSource, Properties};
pub use kubernetes::client::{
    ClientHandle, ClientRequest, ClientType, Error, create_client, create_client_with,
};
