//! dossier-gateway: the API-route layer of the dossier back office.
//!
//! Every `/api` call is forwarded to the backend REST service by a
//! [`forwarder::RequestForwarder`], which reconciles authorization and cookie
//! headers, resolves the body and content type, and relays the response with
//! its status code intact.

pub mod api;
pub mod config;
pub mod correlation;
pub mod forwarder;
pub mod server;
