//! Console Adapter
//!
//! Terminal output for priced pairs.

mod printer;

pub use printer::{format_pair_line, ConsolePrinter, DEFAULT_EXPLORER_TX_URL};
