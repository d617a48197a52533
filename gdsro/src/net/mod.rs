//! Network primitives.
mod socket;
mod error;

pub use socket::Socket;
pub use error::TransportError;
