pub mod kubernetes;
pub mod memory;
