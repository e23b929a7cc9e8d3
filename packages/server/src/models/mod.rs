pub mod photo;
pub mod upload;
pub mod user;
