//! Technical indicator implementations.
//!
//! Every function returns a vector aligned with its input, `None` where the
//! indicator is not yet defined.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger_bands, Band};
pub use ema::{ema, ema_dense};
pub use macd::{macd, MacdSeries};
pub use rsi::rsi_wilder;
pub use sma::sma;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BB_PERIOD: usize = 20;
pub const BB_MULTIPLIER: f64 = 2.0;
pub const VOLUME_SMA_PERIOD: usize = 20;
pub const MOMENTUM_LOOKBACK: usize = 10;
pub const TREND_SMA_PERIOD: usize = 50;
