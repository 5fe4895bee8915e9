/*!
 * Core Module
 * Shared constants and serialization helpers
 */

pub mod limits;
pub mod serde;

pub use limits::*;
