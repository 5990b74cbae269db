pub mod delete;
pub mod kinds;
pub mod wait;
