//! Task queue system for main thread execution
//!
//! Allows any thread to queue work to execute on the main engine thread.
//! Tasks are processed each frame when the engine calls the update export.

pub mod queue;

pub use queue::*;
