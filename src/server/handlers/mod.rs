pub mod accounts;
pub mod bids;
pub mod requests;
pub mod vehicles;
