pub mod ai;
pub mod response;
pub mod screener;
pub mod stock;

pub use ai::*;
pub use response::*;
pub use screener::*;
pub use stock::*;
