pub mod book;
pub mod coin;
pub mod dashboard;
pub mod position;
pub mod price;
pub mod transaction;
