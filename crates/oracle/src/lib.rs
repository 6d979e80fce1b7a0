//! Oracle adapter - 7-Zip as a pass/fail decryption oracle
//!
//! Provides:
//! - `SevenZipOracle`: one child process per trial, bounded by a timeout
//! - `ToolLocator`: finds the 7-Zip executable on this system

mod locator;
mod sevenzip;

pub use locator::ToolLocator;
pub use sevenzip::SevenZipOracle;
