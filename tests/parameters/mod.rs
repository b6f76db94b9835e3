//! Tests for the parameter registry
//!
//! This module organizes the parameter table and registry tests.

pub mod registry_tests;
