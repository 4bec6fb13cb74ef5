//! Axis-language (XPath 1.0 subset) engine over `dom_query` trees.
//!
//! Supports location paths on every XPath axis, predicates (positional and
//! boolean), unions, comparisons, `and`/`or`, and the core string and
//! node-set functions that generated selectors rely on (`contains`,
//! `normalize-space`, `last`, `position`, ...). Arithmetic operators and
//! namespaces are not supported.
//!
//! Element name tests are ASCII case-insensitive, matching how browsers
//! treat HTML documents.

mod eval;
mod lexer;
mod parser;

use dom_query::{Document, NodeRef};

use self::eval::{into_tree_nodes, Evaluator};
use self::parser::Expr;

/// What went wrong while reading an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedLiteral,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown axis `{0}`")]
    UnknownAxis(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("wrong number of arguments to `{0}`")]
    Arity(String),
    #[error("expression does not select nodes")]
    NotANodeSet,
}

/// A malformed or non-selecting expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct XPathError {
    expression: String,
    offset: usize,
    kind: ErrorKind,
}

impl XPathError {
    pub(crate) fn new(expression: &str, offset: usize, kind: ErrorKind) -> Self {
        Self {
            expression: expression.to_string(),
            offset,
            kind,
        }
    }

    /// The expression that failed.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Byte offset of the failure within the expression.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// A compiled expression, reusable across documents.
#[derive(Debug, Clone)]
pub struct XPath {
    source: String,
    expr: Expr,
}

impl XPath {
    /// Parses `source` into a reusable expression.
    pub fn compile(source: &str) -> Result<Self, XPathError> {
        Ok(Self {
            source: source.to_string(),
            expr: parser::parse(source)?,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Element nodes selected from the document root, in document order.
    pub fn select<'a>(&self, doc: &'a Document) -> Result<Vec<NodeRef<'a>>, XPathError> {
        self.select_from(doc.root())
    }

    /// Element nodes selected with `context` as the context node.
    ///
    /// Absolute paths still start from the root of `context`'s tree.
    pub fn select_from<'a>(&self, context: NodeRef<'a>) -> Result<Vec<NodeRef<'a>>, XPathError> {
        let root = context.ancestors_it(None).last().unwrap_or(context);
        let evaluator = Evaluator::new(root);
        let value = evaluator.evaluate(&self.expr, context);
        let nodes = into_tree_nodes(value)
            .ok_or_else(|| XPathError::new(&self.source, 0, ErrorKind::NotANodeSet))?;
        Ok(nodes.into_iter().filter(NodeRef::is_element).collect())
    }
}

/// Compiles and runs `expr` against `doc` in one call.
pub fn select<'a>(doc: &'a Document, expr: &str) -> Result<Vec<NodeRef<'a>>, XPathError> {
    XPath::compile(expr)?.select(doc)
}

/// Collapses XPath whitespace runs (space, tab, CR, LF) and trims the ends.
#[must_use]
pub fn normalize_space(text: &str) -> String {
    text.split([' ', '\t', '\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quotes `value` as an XPath string literal.
///
/// XPath 1.0 has no escape syntax, so values holding both quote kinds are
/// spliced together with `concat()`.
#[must_use]
pub fn literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{value}\"")
    } else if !value.contains('\'') {
        format!("'{value}'")
    } else {
        let parts: Vec<String> = value
            .split('"')
            .map(|part| format!("\"{part}\""))
            .collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}
