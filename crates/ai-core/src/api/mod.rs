//! Backend API: request construction, dispatch, and stream decoding.
//!
//! Presentation is decoupled through the [`ResponseSink`] trait.

pub mod request;
pub mod send;
pub mod sink;
pub mod stream;

pub use request::{RequestPayload, build_request, build_request_body};
pub use send::send_streaming_request;
pub use sink::{CollectingSink, ResponseEvent, ResponseSink};
pub use stream::{GenerateStream, NdjsonDecoder, StreamEvent};
