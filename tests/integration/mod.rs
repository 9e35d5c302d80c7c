//! Integration tests for pg-ai-query.

pub mod config_test;
pub mod generation_test;
