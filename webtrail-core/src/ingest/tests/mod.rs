mod coordinator_tests;
mod state_tests;
pub mod support;
