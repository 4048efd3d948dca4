//! `dailytask`: recovery task recommendation and photo-proof verification.
//!
//! Mood text is classified into trigger tags, the remote catalog suggests a
//! small task, and the user proves completion with a photo that the remote
//! verifier accepts or refuses. Accepted proofs advance the server-side
//! streak.

pub mod api;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod workflow;
