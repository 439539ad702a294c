//! Library components for the `adslot` diagnostics CLI.

#![allow(missing_docs)]

pub mod logging;
pub mod report;
pub mod run;
