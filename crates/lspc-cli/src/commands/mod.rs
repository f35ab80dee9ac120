pub mod account;
pub mod info;
pub mod init;
pub mod pay;
pub mod rebalance;
pub mod swap;
