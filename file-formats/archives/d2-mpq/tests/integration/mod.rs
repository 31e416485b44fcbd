//! Level 3: Feature Integration Tests
//!
//! These tests verify complete features work correctly end-to-end.

pub mod encryption;
pub mod path_separator_handling;
pub mod stream;
