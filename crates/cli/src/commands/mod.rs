pub mod collections;
pub mod images;
