pub mod exchange;
pub mod node;
pub mod tree;
pub mod validate;
