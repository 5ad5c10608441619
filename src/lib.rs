//! Multi-engine prompt translator.
//!
//! [`translate::manager::TranslationManager`] owns a prioritized set of
//! translation engines, a FIFO response cache and per-engine health state,
//! and fails over to the next available engine when one stops answering.
//! [`translate::facade::Translator`] wraps it for callers that want
//! `Option` results, history and usage statistics instead of errors.

pub mod cli;
pub mod config;
pub mod engines;
pub mod translate;
pub mod utils;
