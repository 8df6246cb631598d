pub mod api;
pub mod batch;
pub mod chart;
pub mod config;
pub mod difficulty;
pub mod lookup;
pub mod reduce;
pub mod retry;
pub mod search;
pub mod wiki;
