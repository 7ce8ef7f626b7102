//! Content-addressed block storage
//!
//! Blocks arrive already decoded as JSON; the store only answers
//! "which block does this CID name, if any".

mod block_store;

pub use block_store::BlockStore;
