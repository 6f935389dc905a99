// Application layer - parking workflows over the store and input capabilities

pub mod error;
pub mod input;
pub mod service;

pub use error::*;
pub use input::*;
pub use service::*;
