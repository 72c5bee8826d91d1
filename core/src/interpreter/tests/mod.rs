//! Tests for the interpreter
//!
//! Organized by feature area

mod effect_tests;
mod helpers;
mod try_tests;
