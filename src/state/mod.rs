//! State management module
//!
//! Per-user search session state backing the "show more" pagination flow

pub mod storage;

pub use storage::{StateStorage, SearchSession};
