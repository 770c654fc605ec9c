pub mod listing;
pub mod seed;
