//! Core pieces shared by the M.A.R.C.I.A crates.
//!
//! - [`types`]: provider identity, wire protocols, analysis request/result
//! - [`config`]: the settings file and its env var overrides
//! - [`utils`]: data paths and string helpers

pub mod config;
pub mod types;
pub mod utils;

pub use types::{
    AnalysisRequest, AnalysisResult, PettinessBand, ProviderId, UnknownProviderId, WireProtocol,
};
