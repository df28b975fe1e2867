//! Integration test modules, grouped by endpoint.

mod common;
mod pixie_tests;
