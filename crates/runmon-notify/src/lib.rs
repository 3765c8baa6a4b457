pub mod error;
pub mod mapper;
pub mod sink;
pub mod slot;
pub mod types;

pub use error::*;
pub use mapper::*;
pub use sink::*;
pub use slot::*;
pub use types::*;
