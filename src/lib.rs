//! Rica: linked browser for ICA decomposition components.
//!
//! `core` holds the toolkit-free pieces (selection, cache, bridge, spectra),
//! `io` the file loaders, `session` the per-viewer orchestration and `ui`
//! the egui panels that render a [`session::Frame`].

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod logging;
pub mod session;
pub mod ui;
