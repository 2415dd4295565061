//! Core data structures.

pub mod show;

pub use show::Show;
