pub mod criteria;
pub mod suggestion;
