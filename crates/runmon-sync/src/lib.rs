pub mod error;
pub mod fetch;
pub mod gate;
pub mod poller;
pub mod session;

pub use error::*;
pub use fetch::*;
pub use poller::*;
pub use session::*;
