//! Directive prologue extraction.
//!
//! A directive is a leading string-literal expression statement such as
//! `"use client";`. The prologue ends at the first statement that is not
//! one, so `"use client"` after an import is just an expression.

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::layer::ModuleMeta;

/// Directive strings of `program`, in source order.
pub fn directive_prologue<'a>(program: &'a Program<'a>) -> impl Iterator<Item = &'a str> + 'a {
    program
        .directives
        .iter()
        .map(|directive| directive.directive.as_str())
}

/// Parse `source` and return its directive prologue.
///
/// The source type is inferred from `filename`; unknown extensions are
/// parsed as an ES module. Sources that fail to parse yield whatever
/// prologue the parser recovered, usually nothing.
pub fn extract_directives(source: &str, filename: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(filename).unwrap_or(SourceType::mjs());
    let parsed = Parser::new(&allocator, source, source_type).parse();

    if parsed.panicked {
        tracing::debug!(filename, "parser gave up; no directives extracted");
        return Vec::new();
    }

    directive_prologue(&parsed.program)
        .map(str::to_string)
        .collect()
}

impl ModuleMeta {
    /// Metadata for a module, computed from its source text.
    pub fn from_source(source: &str, filename: &str) -> Self {
        ModuleMeta {
            directives: extract_directives(source, filename),
        }
    }
}
