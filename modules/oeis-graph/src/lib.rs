pub mod client;
pub mod writer;

pub use client::GraphClient;
pub use writer::{GraphWriter, QueryBackend, WriteReport};
