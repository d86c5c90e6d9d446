//! Services Layer
//!
//! One service per page family. Each supplies fields, validators, copy,
//! cache keys and destinations; the read cache and the form controller do
//! the rest.

pub mod beverage_service;
pub mod book_service;
pub mod order_service;

// Re-export for convenience
pub use beverage_service::{BEVERAGES_KEY, BeverageService, beverage_key};
pub use book_service::{BOOKS_KEY, BookService, GENRES_KEY, book_key};
pub use order_service::{ORDERS_KEY, OrderService};
