pub mod audit;
pub mod expenses;
