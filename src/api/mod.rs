mod interface;

pub use interface::{AccountAPI, BidAPI, DynAPI, RequestAPI, VehicleAPI, API};
