//! Transport implementations

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod file;
pub mod http;
pub mod memory;

#[cfg(feature = "console")]
pub use console::{ConsoleFormat, ConsoleOptions, ConsoleTransport};
#[cfg(feature = "file")]
pub use file::{FileOptions, FileTransport};
#[cfg(feature = "http")]
pub use http::ReqwestSender;
pub use http::{BatchRequest, BatchSender, HttpTransport, HttpTransportOptions};
pub use memory::MemoryTransport;

pub use crate::core::{SharedTransport, Transport};
