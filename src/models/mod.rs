pub mod issue;
pub mod listing;
