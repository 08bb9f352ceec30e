pub mod change_detector;
pub mod chunking_strategy;
pub mod indexing_engine;
pub mod search;
