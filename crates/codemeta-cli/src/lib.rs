//! Command line front end over [`codemeta_generator`].

pub mod commands;
pub mod config;
pub mod errors;
pub mod form;
