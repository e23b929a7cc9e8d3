pub mod photo;
pub mod photo_like;
pub mod user;
