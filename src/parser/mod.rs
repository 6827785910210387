// Chart request parser module

pub mod annotate;
pub mod ast;
pub mod facet;
pub mod geom;
pub mod labels;
pub mod lexer;
pub mod pipeline;

// Public API re-exports
pub use ast::RequestSpec;
pub use pipeline::{parse_request, parse_request_str};
