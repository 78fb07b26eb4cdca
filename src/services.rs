pub mod backends;
pub mod base;
pub mod lifecycle;
pub mod observability;
