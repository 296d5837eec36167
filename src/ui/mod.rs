pub mod chat;
pub mod markdown;
pub mod product_grid;
