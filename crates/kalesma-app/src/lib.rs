//! Invitation deck and video generation backed by the Gemini API.
//!
//! The crate wires a small asynchronous orchestration chain: encode uploads,
//! optionally transcribe a message file, generate a five-slide deck through a
//! schema-constrained completion, then render an invitation video through the
//! long-running video endpoint and poll it to completion.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod encode;
pub mod error;
pub mod export;
pub mod gemini;
pub mod invitation;
pub mod services;
