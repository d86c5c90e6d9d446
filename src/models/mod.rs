pub mod beverage;
pub mod book;
pub mod genre;
pub mod order;

pub use beverage::{Beverage, BeverageCreated, NewBeverage};
pub use book::{Book, BookCreated, BookInput};
pub use genre::Genre;
pub use order::{NewOrder, Order, OrderCreated, OrderSummary, OrderWithBeverage, join_orders};
