pub mod amount;
pub mod keypair;

pub use amount::{format_sun_as_trx, parse_trx_to_sun, SUN_PER_TRX, TRX_DECIMALS};
pub use keypair::TronKeypair;
