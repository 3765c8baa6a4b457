pub mod backend;
pub mod error;
pub mod http;
pub mod port;
pub mod source;
pub mod types;

pub use backend::*;
pub use error::*;
pub use port::*;
pub use source::*;
pub use types::*;
