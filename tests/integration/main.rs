//! Integration tests for Robots-Gate
//!
//! These tests use wiremock to serve robots.txt files and drive the checker
//! and the full pipeline end-to-end.

mod checker_tests;
mod common;
mod pipeline_tests;
