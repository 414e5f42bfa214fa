pub mod assertions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::SnapshotAssertion;
#[allow(unused_imports)]
pub use mocks::{mock_connection, MockClient};
#[allow(unused_imports)]
pub use setup::{add, clock, subtract, TestSetup, TestSetupBuilder};
