pub mod bounds;
pub mod impact;
pub mod lp;
