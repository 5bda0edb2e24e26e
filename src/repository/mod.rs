pub mod wallets;
