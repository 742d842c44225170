//! Contract bar storage, calendar alignment and contract-code parsing

pub mod align;
pub mod contract_code;
pub mod store;

pub use align::{full_calendar, trading_calendar};
pub use contract_code::{delivery_of, product_of, spec_from_code};
pub use store::{BarStore, InMemoryBarStore};
