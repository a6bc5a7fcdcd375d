pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod feats;
pub mod ids;
pub mod lists;
pub mod log;
pub mod markup;
pub mod model;
pub mod monsters;
pub mod pipeline;
pub mod references;
pub mod runtime;
pub mod spells;
pub mod wiki;
pub mod writers;
