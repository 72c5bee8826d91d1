//! Tests for the task scheduler
//!
//! All timing runs on a paused tokio clock.

mod helpers;
