//! Guide engine: payloads, tree, uid bookkeeping and the binary codec

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod guide;
pub mod header;
pub mod index;
pub mod io;
pub mod node;
pub mod tree;
pub mod uid;

pub use guide::Guide;
