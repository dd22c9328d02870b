// server/src/web/handlers/mod.rs

pub mod book_handlers;
pub mod cart_handlers;
pub mod order_handlers;
pub mod request_handlers;
pub mod user_handlers;
