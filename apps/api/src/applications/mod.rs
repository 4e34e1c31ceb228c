pub mod attachments;
pub mod handlers;
pub mod models;
