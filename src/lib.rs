// Crate root library declaration and module exports.
pub mod calendar;
pub mod color_utils;
pub mod config;
pub mod context;
pub mod filter;
pub mod form;
pub mod grid;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;

#[cfg(feature = "tui")]
pub mod tui;
