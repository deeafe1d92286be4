pub mod job_outcome;
pub mod listing;
pub mod subscriber;
