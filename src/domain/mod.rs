pub mod email;
pub mod models;
pub mod survey;
