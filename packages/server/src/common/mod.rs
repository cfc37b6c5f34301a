// Common types and utilities shared across the application

pub mod coordinates;
pub mod text;

pub use coordinates::Coordinates;
pub use text::fold_key;
