//! Tests for the template store
//!
//! This module organizes the provider and store tests.

pub mod store_tests;
