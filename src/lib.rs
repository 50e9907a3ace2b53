//! # edgelink - on-disk message-exchange SDK for edge devices
//!
//! This crate lets a sensor/edge device hand data off to a separate
//! transport agent executable through the filesystem: typed records with
//! optional-field tracking are marshalled into JSON files in a fixed
//! directory layout, and files the agent writes back (configuration
//! updates, downlinked messages, execution-status reports) are parsed into
//! typed records again. The SDK never touches the network itself.
//!
//! ## Record kinds
//!
//! - **Status** — a device state snapshot (position, attitude,
//!   temperature, power, opaque device bytes), one per data export
//! - **Data snippet** — a data record exported next to a status, with
//!   positional/attitude/time fields written as deltas against it
//! - **Config** — an ordered identifier/value parameter list supplied by
//!   the transport agent
//! - **General** — a single identifier/value message, exchanged in both
//!   directions
//! - **Exec status** — the agent's post-run report of per-connection
//!   outcomes on both channels
//!
//! ## Exchange layout
//!
//! Everything lives under one configurable base path:
//!
//! ```text
//! lb/data/<timestamp>/sys_status.json    one status per export
//! lb/data/<timestamp>/<type><inst>.json  data snippets + payload files
//! lb/cfg/*.json                          inbound configuration
//! lb/do-msg/general_do_<N>.json          outbound general messages
//! lb/dt-msg/*.json                       inbound general messages
//! hb/do/data                             linked bulk-offload folder
//! log/lb_execution_status.json           exec report, LB half
//! log/hb_execution_status.json           exec report, HB half
//! devinfo/devnuid.txt                    device unique id
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use edgelink::context::EdgeContext;
//! use edgelink::lb::{DataSnippet, Status};
//!
//! let context = EdgeContext::new("/opt/transport")?;
//!
//! let mut status = Status::new("2020-09-03T17:14:25.2-04:00");
//! status.set_latitude(47.6062)?;
//! status.set_longitude(-122.3321)?;
//!
//! let mut snippet = DataSnippet::new("img", 0)?;
//! snippet.set_scores(0.9, 0.8, 0.1)?;
//!
//! context.export_data(&status, &mut [snippet])?;
//! # Ok::<(), edgelink::Error>(())
//! ```
//!
//! All operations are synchronous, blocking file I/O; nothing here is
//! shared across threads and nothing needs to be. Each import builds its
//! parse state from scratch, so imports into separate records are
//! independent by construction.

#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Transport agent process lifecycle (start, poll, stop).
pub mod bot;

/// SDK context: base path management and per-session state.
pub mod context;

/// Common error types for SDK operations.
pub mod error;

/// Execution status reports from the transport agent.
pub mod exec;

/// High-bandwidth channel plumbing.
pub mod hb;

/// Minimal single-pass streaming JSON walker.
pub mod json;

/// Low-bandwidth message records and their on-disk JSON codecs.
pub mod lb;

/// Per-record tracking of which optional fields are populated.
pub mod presence;

/// Timestamp parsing and millisecond subtraction.
pub mod time;

pub use error::{Error, Result};

/// Copy `text` into a fixed-capacity string, truncating at the capacity
/// (on a character boundary) rather than failing.
pub(crate) fn bounded<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
