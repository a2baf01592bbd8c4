//! daylog - background daily file logging
//!
//! Producers log through a [`logging::Logger`]; file output is handed to a
//! dedicated worker thread that rolls files by calendar day, prunes old
//! ones, and switches itself off rather than disturb the host when the disk
//! misbehaves.

pub mod config;
pub mod logging;
