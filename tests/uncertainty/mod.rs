//! Tests for uncertainty estimation
//!
//! This module organizes the covariance tests that run on a full fit model.

pub mod covariance_tests;
