//! Domain Layer - Core types for pairwatch
//!
//! Pure data and parsing logic with no I/O. All external interactions
//! happen through the ports layer.
//!
//! - `pair`: discovered pairs, token identities, pair-created events
//! - `price`: quote quantization and pricing payload parsing

pub mod pair;
pub mod price;

pub use pair::{PairCreatedEvent, PairPrices, PairRecord, TokenIdentity};
pub use price::{parse_price_payload, parse_retry_after, quantize_price, PRICE_SCALE};
