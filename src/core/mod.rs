pub mod combine;
pub mod consumption;
pub mod corrections;
pub mod generation;
pub mod summary;
pub mod table;
pub mod units;
