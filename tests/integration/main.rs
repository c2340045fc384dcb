//! Integration tests for enrichment runs
//!
//! End-to-end runs use a mock model client and temporary directories; the
//! Gemini client is tested against a wiremock server.

mod common;
mod gemini_client_tests;
mod pipeline_tests;
mod resume_tests;
