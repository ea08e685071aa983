pub mod assigner_factory;
pub mod greedy_assigner;
pub mod hungarian_assigner;
