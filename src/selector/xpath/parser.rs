//! Recursive-descent parser producing the expression tree.

use super::lexer::{tokenize, Token, TokenKind};
use super::{ErrorKind, XPathError};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    Literal(String),
    Number(f64),
    Call(Function, Vec<Expr>),
    Path(LocationPath),
    /// A primary expression narrowed by predicates, optionally continued by a relative path.
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfNode,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "self" => Self::SelfNode,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "following" => Self::Following,
            "preceding" => Self::Preceding,
            "attribute" => Self::Attribute,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Element (or attribute) name, stored lowercase.
    Name(String),
    Any,
    Text,
    Node,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Last,
    Position,
    Count,
    Contains,
    StartsWith,
    NormalizeSpace,
    String,
    Concat,
    StringLength,
    Substring,
    SubstringBefore,
    SubstringAfter,
    Translate,
    Not,
    True,
    False,
    Boolean,
    Number,
    Name,
    LocalName,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "last" => Self::Last,
            "position" => Self::Position,
            "count" => Self::Count,
            "contains" => Self::Contains,
            "starts-with" => Self::StartsWith,
            "normalize-space" => Self::NormalizeSpace,
            "string" => Self::String,
            "concat" => Self::Concat,
            "string-length" => Self::StringLength,
            "substring" => Self::Substring,
            "substring-before" => Self::SubstringBefore,
            "substring-after" => Self::SubstringAfter,
            "translate" => Self::Translate,
            "not" => Self::Not,
            "true" => Self::True,
            "false" => Self::False,
            "boolean" => Self::Boolean,
            "number" => Self::Number,
            "name" => Self::Name,
            "local-name" => Self::LocalName,
            _ => return None,
        })
    }

    /// Inclusive bounds on the argument count.
    fn arity(self) -> (usize, usize) {
        match self {
            Self::Last | Self::Position | Self::True | Self::False => (0, 0),
            Self::Count | Self::Not | Self::Boolean => (1, 1),
            Self::NormalizeSpace
            | Self::String
            | Self::StringLength
            | Self::Number
            | Self::Name
            | Self::LocalName => (0, 1),
            Self::Contains | Self::StartsWith | Self::SubstringBefore | Self::SubstringAfter => (2, 2),
            Self::Substring => (2, 3),
            Self::Translate => (3, 3),
            Self::Concat => (2, usize::MAX),
        }
    }
}

/// Parses a complete expression.
pub fn parse(expr: &str) -> Result<Expr, XPathError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        source: expr,
        tokens,
        pos: 0,
    };
    let tree = parser.or_expr()?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(parser.unexpected(token));
    }
    Ok(tree)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.pos).map(|t| t.kind.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(TokenKind::Name(n)) if n == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, kind: ErrorKind) -> XPathError {
        let offset = self
            .tokens
            .get(self.pos)
            .map_or(self.source.len(), |t| t.offset);
        XPathError::new(self.source, offset, kind)
    }

    fn unexpected(&self, token: &Token) -> XPathError {
        XPathError::new(
            self.source,
            token.offset,
            ErrorKind::UnexpectedToken(token.kind.to_string()),
        )
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), XPathError> {
        if self.eat(kind) {
            return Ok(());
        }
        match self.tokens.get(self.pos) {
            Some(token) => Err(self.unexpected(token)),
            None => Err(self.error(ErrorKind::UnexpectedEnd)),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.and_expr()?;
        while self.eat_keyword("or") {
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.equality_expr()?;
        while self.eat_keyword("and") {
            let right = self.equality_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Eq) => CmpOp::Eq,
                Some(TokenKind::NotEq) => CmpOp::NotEq,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.relational_expr()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
    }

    fn relational_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.unary_expr()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Lt) => CmpOp::Lt,
                Some(TokenKind::LtEq) => CmpOp::LtEq,
                Some(TokenKind::Gt) => CmpOp::Gt,
                Some(TokenKind::GtEq) => CmpOp::GtEq,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary_expr()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
    }

    fn unary_expr(&mut self) -> Result<Expr, XPathError> {
        if self.eat(&TokenKind::Minus) {
            return Ok(Expr::Negate(Box::new(self.unary_expr()?)));
        }
        self.union_expr()
    }

    fn union_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.path_expr()?;
        while self.eat(&TokenKind::Pipe) {
            let right = self.path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn starts_primary(&self) -> bool {
        match self.peek() {
            Some(TokenKind::Literal(_) | TokenKind::Number(_) | TokenKind::LParen) => true,
            Some(TokenKind::Name(name)) => {
                self.peek_at(1) == Some(&TokenKind::LParen) && !is_node_type(name)
            }
            _ => false,
        }
    }

    fn path_expr(&mut self) -> Result<Expr, XPathError> {
        if !self.starts_primary() {
            return Ok(Expr::Path(self.location_path()?));
        }

        let primary = self.primary_expr()?;
        let mut predicates = Vec::new();
        while self.peek() == Some(&TokenKind::LBracket) {
            predicates.push(self.predicate()?);
        }

        let mut steps = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::Slash) => {
                    self.pos += 1;
                }
                Some(TokenKind::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step::descendant_or_self());
                }
                _ => break,
            }
            steps.push(self.step()?);
        }

        if predicates.is_empty() && steps.is_empty() {
            return Ok(primary);
        }
        Ok(Expr::Filter {
            primary: Box::new(primary),
            predicates,
            steps,
        })
    }

    fn primary_expr(&mut self) -> Result<Expr, XPathError> {
        match self.advance() {
            Some(TokenKind::Literal(s)) => Ok(Expr::Literal(s)),
            Some(TokenKind::Number(n)) => Ok(Expr::Number(n)),
            Some(TokenKind::LParen) => {
                let inner = self.or_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            Some(TokenKind::Name(name)) => {
                self.pos -= 1;
                let function = Function::from_name(&name)
                    .ok_or_else(|| self.error(ErrorKind::UnknownFunction(name.clone())))?;
                self.pos += 2;
                let mut args = Vec::new();
                if !self.eat(&TokenKind::RParen) {
                    loop {
                        args.push(self.or_expr()?);
                        if self.eat(&TokenKind::Comma) {
                            continue;
                        }
                        self.expect(&TokenKind::RParen)?;
                        break;
                    }
                }
                let (min, max) = function.arity();
                if args.len() < min || args.len() > max {
                    return Err(self.error(ErrorKind::Arity(name)));
                }
                Ok(Expr::Call(function, args))
            }
            Some(_) => {
                self.pos -= 1;
                Err(self.unexpected(&self.tokens[self.pos]))
            }
            None => Err(self.error(ErrorKind::UnexpectedEnd)),
        }
    }

    fn location_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(TokenKind::Slash) => {
                self.pos += 1;
                if !self.starts_step() {
                    return Ok(LocationPath {
                        absolute: true,
                        steps,
                    });
                }
                true
            }
            Some(TokenKind::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::descendant_or_self());
                true
            }
            _ => false,
        };

        steps.push(self.step()?);
        loop {
            match self.peek() {
                Some(TokenKind::Slash) => {
                    self.pos += 1;
                }
                Some(TokenKind::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step::descendant_or_self());
                }
                _ => break,
            }
            steps.push(self.step()?);
        }

        Ok(LocationPath { absolute, steps })
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                TokenKind::Name(_)
                    | TokenKind::Star
                    | TokenKind::At
                    | TokenKind::Dot
                    | TokenKind::DoubleDot
            )
        )
    }

    fn step(&mut self) -> Result<Step, XPathError> {
        if self.eat(&TokenKind::Dot) {
            return Ok(Step {
                axis: Axis::SelfNode,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }
        if self.eat(&TokenKind::DoubleDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }

        let axis = if self.eat(&TokenKind::At) {
            Axis::Attribute
        } else if let (Some(TokenKind::Name(name)), Some(TokenKind::DoubleColon)) =
            (self.peek(), self.peek_at(1))
        {
            let name = name.clone();
            let axis = Axis::from_name(&name).ok_or_else(|| self.error(ErrorKind::UnknownAxis(name)))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = self.node_test()?;
        let mut predicates = Vec::new();
        while self.peek() == Some(&TokenKind::LBracket) {
            predicates.push(self.predicate()?);
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self) -> Result<NodeTest, XPathError> {
        match self.advance() {
            Some(TokenKind::Star) => Ok(NodeTest::Any),
            Some(TokenKind::Name(name)) => {
                if is_node_type(&name) && self.peek() == Some(&TokenKind::LParen) {
                    self.pos += 1;
                    self.expect(&TokenKind::RParen)?;
                    return Ok(match name.as_str() {
                        "text" => NodeTest::Text,
                        "comment" => NodeTest::Comment,
                        _ => NodeTest::Node,
                    });
                }
                Ok(NodeTest::Name(name.to_ascii_lowercase()))
            }
            Some(_) => {
                self.pos -= 1;
                Err(self.unexpected(&self.tokens[self.pos]))
            }
            None => Err(self.error(ErrorKind::UnexpectedEnd)),
        }
    }

    fn predicate(&mut self) -> Result<Expr, XPathError> {
        self.expect(&TokenKind::LBracket)?;
        let expr = self.or_expr()?;
        self.expect(&TokenKind::RBracket)?;
        Ok(expr)
    }
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "text" | "node" | "comment")
}
