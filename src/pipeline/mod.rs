// src/pipeline/mod.rs

pub mod charts;
pub mod classifier;
pub mod enrichment;
pub mod geo;
pub mod parser;
pub mod readers;
pub mod render;
pub mod summary;
pub mod writers;
