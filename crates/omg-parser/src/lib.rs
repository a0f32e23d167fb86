//! OMG parser: converts pattern-language source text into a positioned AST.
//!
//! ```text
//! OMG source → Cursor → Parser → ParseResult { ast, errors }
//! ```

mod parse_decl;
mod parse_expr;
mod parser;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

pub use omg_types::{ParseError, ParseResult};
pub use parse_decl::{IMPORT_FLAGS, OPTIONAL_TOKENS, RESOLVER_FLAGS, RESOLVER_SCOPES};
pub use parser::{Parser, MAX_ERRORS, MAX_NESTING_DEPTH};

/// Parse one OMG document.
///
/// Never panics: an unexpected fault inside the parser is caught here and
/// turned into an empty `root` with a single error carrying the fault
/// message, so callers always receive a usable tree.
pub fn parse(source: &str) -> ParseResult {
    debug!(bytes = source.len(), "parsing OMG source");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| Parser::new(source).parse()));
    match outcome {
        Ok(result) => {
            debug!(
                nodes = result.ast.node_count(),
                errors = result.errors.len(),
                "parse finished"
            );
            result
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "internal parser fault");
            ParseResult::fallback(format!("Internal parser error: {message}"))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".to_string()
    }
}
