//! Server side of the Git smart HTTP transport: pkt-line framing, ref
//! advertisement, the upload-pack and receive-pack state machines, and the
//! actix-web adapter that drives one service instance per request. All
//! persistent state lives behind the [`agent::RepoAgent`] trait.

pub mod agent;
pub mod auth;
pub mod capability;
pub mod config;
pub mod error;
pub mod http;
pub mod oid;
pub mod pkt_line;
pub mod refs;
pub mod serve;
pub mod service;
pub mod telemetry;
