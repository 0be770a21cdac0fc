pub mod api;
pub mod character;
pub mod config;
pub mod data;
pub mod error;
pub mod modifiers;
pub mod optimizer;
pub mod scorer;
pub mod slots;

pub use error::{GearForgeError, GfResult};
