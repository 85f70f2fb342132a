//! Request and response shapes, one module per endpoint group.

pub mod access;
pub mod bitacora;
pub mod heatmap;
