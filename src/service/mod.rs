pub mod asset_service;
pub mod chain_gateway;
pub mod keystore;
pub mod swap_router;
pub mod token_info_service;
pub mod transfer_service;
