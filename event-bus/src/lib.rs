//! Notice bus for settlement events
//!
//! In-process pub/sub channel connecting the settlement core to its external
//! consumers (oracle agents, client surfaces):
//! - Typed notice envelopes with JSON payloads
//! - Broadcast fan-out with per-subscriber cursors
//! - Best-effort delivery: a bus with no subscribers drops notices
//! - FIFO ordering over a single channel

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bus;
pub mod error;
pub mod message;
pub mod types;

pub use bus::NoticeBus;
pub use error::{Error, Result};
pub use message::Notice;
pub use types::NoticeType;
