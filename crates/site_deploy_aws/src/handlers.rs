//! Deploy components and the command entry points built from them.

pub mod commands;
pub mod domain;
pub mod invalidate;
pub mod sync;
