//! `natiq`: lexer, parser, and tree-walking evaluator for the Arabic-keyword
//! scripting language described in SPEC_FULL.md.
//!
//! The pipeline is the usual three stages - [`token::Lexer`] turns source
//! text into a token stream, [`parse::Parser`] builds an [`ast::Program`],
//! and [`engine::Engine`] walks it - mirroring how the teacher's `rhai`
//! engine is laid out, minus its bytecode/AST-optimization passes, which
//! this interpreter has no use for.

pub mod ast;
pub mod builtins;
pub mod engine;
pub mod error;
pub mod parse;
pub mod scope;
pub mod token;
pub mod value;

pub use engine::Engine;
pub use error::{Error, ErrorKind, EvalError, LexError, ParseError};
pub use token::Position;
pub use value::Value;

/// Run a complete script against a fresh engine - the convenience entry
/// point `natiq-cli`'s `run` subcommand uses for non-interactive execution.
pub fn run(source: &str) -> Result<(), Error> {
    Engine::new().run_source(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_fizz_style_program_runs() {
        let source = r#"
دالة تنبيه(ن) {
    إذا ن % 2 == 0 {
        ارجع "زوجي"
    } وإلا {
        ارجع "فردي"
    }
}

اطبع_سطر(تنبيه(4))
اطبع_سطر(تنبيه(7))
"#;
        assert!(run(source).is_ok());
    }

    #[test]
    fn lex_error_surfaces_with_position() {
        let err = run("متغير س = @").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Lex(LexError::UnknownSymbol('@'))));
    }
}
