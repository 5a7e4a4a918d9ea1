//! Transport module - TCP sockets and frame I/O.
//!
//! Every call uses its own short-lived TCP connection carrying exactly one
//! request frame and one response frame.

mod tcp;

pub use tcp::{bind, connect, drain, read_frame, write_frame};
