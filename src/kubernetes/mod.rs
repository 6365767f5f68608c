//! This mod contains shared portions of the kubernetes implementations.

pub mod client;
