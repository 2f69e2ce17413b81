//! Session-scoped nutrition ledger, recipe matching and the analysis and
//! recommendation gateways behind the FoodStats API.

pub mod analysis;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod matcher;
pub mod nutrition;
pub mod profile;
pub mod recommend;
