#![allow(non_snake_case)]

pub mod analysis;
pub mod config;
pub mod data_model;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod utils;

pub use analysis::{run_analysis, AnalysisReport};
pub use error::PipelineError;
