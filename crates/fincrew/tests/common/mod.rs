//! Shared test utilities for fincrew integration tests.
//!
//! - `TestHarness` wires a real job runner against temp directories and
//!   a file-backed store
//! - `ScriptedClient` stands in for the language model
//! - `build_pdf` produces small text PDFs with lopdf

pub mod fakes;
pub mod harness;
pub mod pdf;

pub use fakes::ScriptedClient;
pub use harness::TestHarness;
pub use pdf::build_pdf;
