//! Core module for detection events, layout and marker state.

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod layout;
pub mod marker;
pub mod parser;
pub mod timer;
pub mod viewport;
