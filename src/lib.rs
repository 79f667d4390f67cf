// Crate root library declaration and module exports.
pub mod calendar;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod derived;
pub mod form;
pub mod model;
pub mod reader;
pub mod section;
pub mod sync;
pub mod time;
