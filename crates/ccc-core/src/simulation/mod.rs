pub mod distribution;
pub mod sensitivity;
