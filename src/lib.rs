//! Live tool-activity status messages for chat channels.
//!
//! As an agent runs tools, the reply pipeline feeds lifecycle events into a
//! [`tracker::StatusTracker`], which maintains a single status message in the
//! target channel and finalizes it when the reply completes. Delivery is
//! best-effort: a broken chat connection never disrupts the tools being
//! tracked.

pub mod display;
pub mod gateway;
pub mod tracker;

pub use gateway::{MessageGateway, MessageHandle};
pub use tracker::{ActivityConfig, StatusTracker, create_status_tracker};
