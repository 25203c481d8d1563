//! Data models

pub mod user;
pub mod scan;
pub mod lists;
pub mod report;
pub mod watchlist;
pub mod api_key;

pub use user::*;
pub use scan::*;
pub use lists::*;
pub use report::*;
pub use watchlist::*;
pub use api_key::*;
