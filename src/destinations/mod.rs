//! Built-in destinations

pub mod datadog;
pub mod nop;
pub mod remote;
pub mod stream;

pub use nop::NopDestination;
pub use remote::{RemoteDestination, Shipper};
pub use stream::StreamSink;
