//! Middleware modules

pub mod recycle;
