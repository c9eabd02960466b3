//! One rendering function per operation.

pub mod draw;
pub mod pixels;
pub mod sprite;
