pub mod intake;
pub mod listing;
