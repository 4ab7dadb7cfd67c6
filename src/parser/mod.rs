// Dashboard DSL Parser Module

pub mod ast;
pub mod lexer;
pub mod panel;
pub mod pipeline;

// Public API re-exports
pub use ast::{DashboardSpec, Panel};
pub use pipeline::{parse_dashboard, DEFAULT_PIPELINE};
