//! C-compatible entry points

pub mod exports;
