//! Infrastructure adapters: transports that carry framed messages.

pub mod transport;

#[cfg(not(target_arch = "wasm32"))]
pub use transport::ChannelTransport;
pub use transport::InMemoryTransport;
