//! Application layer for pushbox.
//!
//! This crate coordinates the gateway and the local inbox: it decides when the
//! store is replaced, when it is only added to, and what the presentation layer
//! hears about it.

pub mod controller;
mod journal;
pub mod presenter;

pub use controller::{
    ControllerState, IngestOutcome, NotificationAction, ReconciliationController, RemovalReport,
    StartupOptions,
};
pub use presenter::{InboxPresenter, StatusMessage};
