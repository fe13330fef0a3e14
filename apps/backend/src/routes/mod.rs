pub mod auth;
pub mod sessions;
pub mod stats;
pub mod subjects;
pub mod summary;
pub mod users;
