pub mod clock;
pub mod config;
pub mod error;
pub mod market;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, DataSourceKind};
pub use error::{Error, Result};
pub use market::MarketDataSource;
pub use types::*;
