//! Error taxonomy for the lex/parse/eval pipeline.

use crate::token::Position;
use crate::value::Value;
use std::error::Error as StdError;
use std::fmt;

/// Errors raised while turning source text into tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    /// An unrecognized character was encountered.
    UnknownSymbol(char),
    /// A string literal was never closed before EOF.
    UnterminatedString,
    /// A `/* ... */` comment was never closed before EOF.
    ///
    /// The source program silently let this reach EOF; we treat it as an
    /// error instead, per the redesign flag on unterminated block comments.
    UnterminatedBlockComment,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSymbol(ch) => write!(f, "unknown symbol: {ch}"),
            Self::UnterminatedString => write!(f, "unterminated string"),
            Self::UnterminatedBlockComment => write!(f, "unterminated block comment"),
        }
    }
}

impl StdError for LexError {}

/// Errors raised while building the AST from a token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A specific token kind was required but something else was found.
    Expected { expected: String, found: String },
    /// The current token cannot start any valid expression.
    UnexpectedExpression(String),
    /// A chained postfix form (`f()[0]`, `obj.x(1)`, ...) was attempted.
    ///
    /// Not a grammar hole we silently extend - the source never supported
    /// it, and spec §9 asks implementers to flag rather than lift it.
    ChainedPostfixNotSupported,
    /// A reserved keyword was used where an identifier was required.
    ReservedKeyword(String),
    /// A lex error surfaced while the parser was still pulling tokens.
    Lex(LexError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, got {found}")
            }
            Self::UnexpectedExpression(found) => write!(f, "unexpected expression, got {found}"),
            Self::ChainedPostfixNotSupported => {
                write!(f, "chained postfix expressions are not supported")
            }
            Self::ReservedKeyword(word) => {
                write!(f, "'{word}' is a reserved keyword and cannot be used as a name")
            }
            Self::Lex(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self::Lex(err)
    }
}

/// Errors raised while walking the AST.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Usage of a name that resolves to nothing (variable, built-in, or function).
    UndefinedVariable(String),
    /// A `var`/`const` declared a name already present in the current scope.
    AlreadyDefined(String),
    /// An assignment targeted a name in the constant set.
    CannotModifyConstant(String),
    /// Division (or modulo) by zero.
    DivisionByZero,
    /// An operator was applied to operand types it has no rule for.
    TypeMismatch { op: String, lhs: String, rhs: String },
    /// A value that is not callable appeared in call position.
    NotCallable(String),
    /// A value that cannot be indexed appeared in index position.
    NotIndexable(String),
    /// List/Text index, or Object key, was out of range / missing.
    IndexOutOfRange { len: usize, index: i64 },
    MissingKey(String),
    /// A value that is not iterable appeared as a `for` target.
    NotIterable(String),
    /// A hosted facade (web/db/http/json/...) has no working implementation.
    HostUnavailable(String),
    /// A `break`/`continue`/`return` signal escaped every handler meant to
    /// catch it - a bug in the evaluator, not in the interpreted program.
    Internal(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable(name) => write!(f, "undefined variable: {name}"),
            Self::AlreadyDefined(name) => write!(f, "already defined: {name}"),
            Self::CannotModifyConstant(name) => write!(f, "cannot modify constant: {name}"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::TypeMismatch { op, lhs, rhs } => {
                write!(f, "operator '{op}' not defined for {lhs} and {rhs}")
            }
            Self::NotCallable(kind) => write!(f, "value of type {kind} is not callable"),
            Self::NotIndexable(kind) => write!(f, "value of type {kind} cannot be indexed"),
            Self::IndexOutOfRange { len, index } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::MissingKey(key) => write!(f, "no such key: {key}"),
            Self::NotIterable(kind) => write!(f, "value of type {kind} is not iterable"),
            Self::HostUnavailable(name) => {
                write!(f, "'{name}' has no implementation in this build")
            }
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl StdError for EvalError {}

/// A [`Signal`] is non-local control flow threaded through the evaluator's
/// own `Result` channel rather than through a separate mechanism, mirroring
/// how the teacher folds `LoopBreak`/`Return` into `EvalAltResult`.
#[derive(Debug, Clone)]
pub enum Signal {
    Return(Value),
    Break,
    Continue,
}

/// Either a genuine evaluation error or a control-flow signal in flight.
#[derive(Debug, Clone)]
pub enum Flow {
    Error(EvalError),
    Signal(Signal),
}

impl From<EvalError> for Flow {
    fn from(err: EvalError) -> Self {
        Self::Error(err)
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => write!(f, "{err}"),
            Self::Signal(_) => write!(f, "internal error: uncaught control-flow signal"),
        }
    }
}

/// A single positioned diagnostic, the unit the CLI prints and exits on.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub position: Option<Position>,
}

#[derive(Debug, Clone)]
pub enum ErrorKind {
    Lex(LexError),
    Parse(ParseError),
    Eval(EvalError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Lex(e) => write!(f, "{e}")?,
            ErrorKind::Parse(e) => write!(f, "{e}")?,
            ErrorKind::Eval(e) => write!(f, "{e}")?,
        }
        if let Some(pos) = self.position {
            if let Some(line) = pos.line() {
                write!(f, " at line {line}")?;
                if let Some(col) = pos.column() {
                    write!(f, ", column {col}")?;
                }
            }
        }
        Ok(())
    }
}

impl StdError for Error {}

impl Error {
    #[must_use]
    pub fn lex(err: LexError, position: Position) -> Self {
        Self { kind: ErrorKind::Lex(err), position: Some(position) }
    }
    #[must_use]
    pub fn parse(err: ParseError, position: Position) -> Self {
        Self { kind: ErrorKind::Parse(err), position: Some(position) }
    }
    #[must_use]
    pub fn eval(err: EvalError, position: Position) -> Self {
        Self { kind: ErrorKind::Eval(err), position: Some(position) }
    }

    /// The process exit code this error maps to, per SPEC_FULL §6.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match &self.kind {
            ErrorKind::Lex(_) | ErrorKind::Parse(_) | ErrorKind::Eval(_) => 1,
        }
    }
}
