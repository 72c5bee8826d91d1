//! Tests for the execution drivers

mod abort_tests;
