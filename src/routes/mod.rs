pub mod default_route;
pub mod worker_route;
