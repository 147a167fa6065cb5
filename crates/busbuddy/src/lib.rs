//! `busbuddy` - A school bus tracking demo
//!
//! This library provides role-based navigation over a small schools
//! registry, a simulated live bus location feed, a per-route chat log, an
//! SOS signal and persistent admin route editing.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod chat;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod logging;
pub mod map;
pub mod navigation;
pub mod registry;
pub mod shell;
pub mod sos;
pub mod storage;
pub mod theme;
pub mod view;

pub use chat::{Message, MessageLog};
pub use config::Config;
pub use controller::Controller;
pub use error::{Error, Result};
pub use location::{Location, LocationSimulator};
pub use logging::init_logging;
pub use map::{MapBinding, MapProvider};
pub use navigation::{BoardingStatus, Role, Screen, Tab, ViewState};
pub use registry::{School, SchoolsRegistry};
pub use sos::SosSignal;
pub use storage::{Storage, StorageStats};
pub use theme::{Theme, ThemeVariant};
pub use view::render;
