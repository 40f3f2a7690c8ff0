//! Microsoft Graph plumbing: on-behalf-of token exchange and a small REST client.

pub mod client;
pub mod obo;

pub use client::GraphClient;
pub use obo::OboExchanger;
