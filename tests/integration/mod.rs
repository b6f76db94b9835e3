//! Integration tests for the nllfit-rs library
//!
//! This module organizes all integration tests that test the library as a whole,
//! rather than individual components.

// Numeric contract of the full cost on a small analysis
pub mod end_to_end;

// Finite Monte Carlo statistics
pub mod mc_stat;

// Toy datasets, sequential and parallel
pub mod toys;
