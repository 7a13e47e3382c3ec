pub mod health;
pub mod me;
pub mod register;
pub mod session;
pub mod types;
pub mod users;
