pub mod action;
pub mod app;
pub mod error;
pub mod event;
pub mod model;

pub use action::*;
pub use app::*;
pub use error::*;
pub use event::*;
pub use model::*;
