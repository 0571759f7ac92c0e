//! Result store
//!
//! Stage outputs are cached here under their stage key and read back when
//! the terminal stage assembles its dataset.

mod result_store;

pub use result_store::{make_key, ResultStore, StoredDatum};
