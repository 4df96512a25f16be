pub mod baseline;
pub mod correlation;
pub mod ratios;
pub mod report;
pub mod table;
pub mod trend;
