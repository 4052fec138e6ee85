//! Colored one-line-per-pair printer

use chrono::{DateTime, Local};
use colored::*;

use crate::domain::{PairPrices, PairRecord};
use crate::ports::PairSink;

pub const DEFAULT_EXPLORER_TX_URL: &str = "https://bscscan.com/tx/";

/// Prints each priced pair to stdout with a local timestamp
#[derive(Debug, Clone)]
pub struct ConsolePrinter {
    explorer_tx_url: String,
}

impl ConsolePrinter {
    pub fn new(explorer_tx_url: impl Into<String>) -> Self {
        Self {
            explorer_tx_url: explorer_tx_url.into(),
        }
    }
}

impl Default for ConsolePrinter {
    fn default() -> Self {
        Self::new(DEFAULT_EXPLORER_TX_URL)
    }
}

/// Render one priced pair
pub fn format_pair_line(
    pair: &PairRecord,
    prices: PairPrices,
    explorer_tx_url: &str,
    now: DateTime<Local>,
) -> String {
    let token0 = pair.token0();
    let token1 = pair.token1();

    format!(
        "{}{} {} {} ({}) /{} ({}): {} / {} {} {} Token0={}, Token1={}",
        format!("[{}]", now.format("%H:%M:%S%.3f")).bright_black(),
        "[Token]".bright_cyan().bold(),
        "New Token Detected:".green().bold(),
        token0.name.bright_white().bold(),
        token0.symbol,
        token1.name.bright_white().bold(),
        token1.symbol,
        token0.address,
        token1.address,
        format!("{}{}", explorer_tx_url, pair.tx_hash()).bright_blue().underline(),
        "Price:".yellow(),
        prices.price0,
        prices.price1,
    )
}

impl PairSink for ConsolePrinter {
    fn display(&self, pairs: &[PairRecord]) {
        let now = Local::now();
        for pair in pairs {
            if let Some(prices) = pair.prices() {
                println!("{}", format_pair_line(pair, prices, &self.explorer_tx_url, now));
            }
        }
    }
}
