pub mod subscriber_db;
