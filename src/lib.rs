//! Techno-economic evaluation of thermal energy storage (TES) systems.
//!
//! The [`tes`] module calculates capital and operating costs and the levelised cost of storage
//! for a single storage system, [`cashflow`] builds a year-by-year cash-flow ledger and
//! [`calibration`] fits material prices to known costs. The remaining modules provide the
//! command-line program which evaluates scenarios read from TOML files.
#![warn(missing_docs)]
pub mod calibration;
pub mod cashflow;
pub mod cli;
pub mod error;
pub mod evaluation;
pub mod finance;
pub mod geometry;
pub mod input;
pub mod log;
pub mod output;
pub mod parameters;
pub mod settings;
pub mod tes;
pub mod units;

#[cfg(test)]
mod fixture;
