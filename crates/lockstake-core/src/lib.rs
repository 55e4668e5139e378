pub mod constants;
pub mod error;
pub mod types;
pub mod record;
pub mod config;
pub mod params;
pub mod math;
pub mod interest;

pub use constants::*;
pub use error::{StakeError, TransferError};
pub use types::*;
pub use record::*;
pub use config::GlobalConfig;
pub use params::{AssetKind, DeployParams};
