pub mod analysis;
pub mod optimize;
