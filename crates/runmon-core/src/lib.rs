pub mod config;
pub mod logs;
pub mod state;
pub mod timestamp;
pub mod types;
pub mod validation;

pub use config::*;
pub use logs::*;
pub use state::*;
pub use types::*;
pub use validation::*;
