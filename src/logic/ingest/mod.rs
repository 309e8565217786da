//! Ingest Module - network intake and the sample window
//!
//! - `listener` accepts producer connections
//! - `connection` frames and decodes messages from one connection
//! - `sample` is the decoded message and its decoder
//! - `buffer` is the bounded window shared with the analysis loop

pub mod buffer;
pub mod connection;
pub mod listener;
pub mod sample;

pub use buffer::{BufferStatus, SampleBuffer};
pub use connection::handle_connection;
pub use listener::run_listener;
pub use sample::{Sample, SampleDecoder};
