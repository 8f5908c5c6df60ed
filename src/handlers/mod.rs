pub mod common;
pub mod dispatch;
pub mod erection;
pub mod health;
pub mod invoices;
pub mod precast_stock;
pub mod work_orders;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
