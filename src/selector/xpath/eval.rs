//! Tree-walking evaluator for parsed axis-language expressions.
//!
//! Node-sets are kept in document order between steps; reverse axes hand their
//! candidates to predicates in proximity order so that `preceding-sibling::x[1]`
//! means the nearest one.

use std::collections::HashMap;

use dom_query::{NodeId, NodeRef};

use super::parser::{Axis, CmpOp, Expr, Function, LocationPath, NodeTest, Step};
use super::normalize_space;

/// A node visible to expressions: tree nodes plus synthesized attribute nodes.
#[derive(Debug, Clone)]
pub enum XNode<'a> {
    Node(NodeRef<'a>),
    Attr {
        owner: NodeRef<'a>,
        index: usize,
        name: String,
        value: String,
    },
}

impl<'a> XNode<'a> {
    fn string_value(&self) -> String {
        match self {
            Self::Node(node) => node.text().to_string(),
            Self::Attr { value, .. } => value.clone(),
        }
    }

    fn name(&self) -> String {
        match self {
            Self::Node(node) if node.is_element() => node
                .node_name()
                .map(|n| n.to_ascii_lowercase())
                .unwrap_or_default(),
            Self::Node(_) => String::new(),
            Self::Attr { name, .. } => name.clone(),
        }
    }

    fn as_node(&self) -> Option<NodeRef<'a>> {
        match self {
            Self::Node(node) => Some(*node),
            Self::Attr { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value<'a> {
    Nodes(Vec<XNode<'a>>),
    Str(String),
    Num(f64),
    Bool(bool),
}

#[derive(Debug, Clone)]
struct Context<'a> {
    node: XNode<'a>,
    position: usize,
    size: usize,
}

/// Evaluation state for one document: its preorder node list and an index into it.
pub struct Evaluator<'a> {
    root: NodeRef<'a>,
    all: Vec<NodeRef<'a>>,
    order: HashMap<NodeId, usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(root: NodeRef<'a>) -> Self {
        let all: Vec<NodeRef<'a>> = std::iter::once(root).chain(root.descendants_it()).collect();
        let order = all.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        Self { root, all, order }
    }

    /// Evaluates `expr` with `context` as the context node.
    pub fn evaluate(&self, expr: &Expr, context: NodeRef<'a>) -> Value<'a> {
        let ctx = Context {
            node: XNode::Node(context),
            position: 1,
            size: 1,
        };
        self.eval(expr, &ctx)
    }

    fn key(&self, node: &XNode<'a>) -> (usize, usize) {
        match node {
            XNode::Node(n) => (self.order.get(&n.id).copied().unwrap_or(usize::MAX), 0),
            XNode::Attr { owner, index, .. } => (
                self.order.get(&owner.id).copied().unwrap_or(usize::MAX),
                index + 1,
            ),
        }
    }

    fn sort_unique(&self, nodes: &mut Vec<XNode<'a>>) {
        nodes.sort_by_key(|n| self.key(n));
        nodes.dedup_by(|a, b| self.key(a) == self.key(b));
    }

    fn eval(&self, expr: &Expr, ctx: &Context<'a>) -> Value<'a> {
        match expr {
            Expr::Or(a, b) => Value::Bool(
                to_bool(&self.eval(a, ctx)) || to_bool(&self.eval(b, ctx)),
            ),
            Expr::And(a, b) => Value::Bool(
                to_bool(&self.eval(a, ctx)) && to_bool(&self.eval(b, ctx)),
            ),
            Expr::Compare(op, a, b) => {
                Value::Bool(compare(*op, &self.eval(a, ctx), &self.eval(b, ctx)))
            }
            Expr::Negate(inner) => Value::Num(-to_number(&self.eval(inner, ctx))),
            Expr::Union(a, b) => {
                let mut nodes = match self.eval(a, ctx) {
                    Value::Nodes(n) => n,
                    _ => Vec::new(),
                };
                if let Value::Nodes(more) = self.eval(b, ctx) {
                    nodes.extend(more);
                }
                self.sort_unique(&mut nodes);
                Value::Nodes(nodes)
            }
            Expr::Literal(s) => Value::Str(s.clone()),
            Expr::Number(n) => Value::Num(*n),
            Expr::Call(function, args) => self.call(*function, args, ctx),
            Expr::Path(path) => Value::Nodes(self.location_path(path, ctx)),
            Expr::Filter {
                primary,
                predicates,
                steps,
            } => {
                let Value::Nodes(mut nodes) = self.eval(primary, ctx) else {
                    return Value::Nodes(Vec::new());
                };
                self.sort_unique(&mut nodes);
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate);
                }
                for step in steps {
                    nodes = self.step(&nodes, step);
                }
                Value::Nodes(nodes)
            }
        }
    }

    fn location_path(&self, path: &LocationPath, ctx: &Context<'a>) -> Vec<XNode<'a>> {
        let mut nodes = if path.absolute {
            vec![XNode::Node(self.root)]
        } else {
            vec![ctx.node.clone()]
        };
        for step in &path.steps {
            nodes = self.step(&nodes, step);
            if nodes.is_empty() {
                break;
            }
        }
        nodes
    }

    fn step(&self, input: &[XNode<'a>], step: &Step) -> Vec<XNode<'a>> {
        let mut out = Vec::new();
        for context in input {
            let mut candidates: Vec<XNode<'a>> = self
                .axis(context, step.axis)
                .into_iter()
                .filter(|n| matches_test(n, &step.test, step.axis))
                .collect();
            for predicate in &step.predicates {
                candidates = self.filter(candidates, predicate);
            }
            out.extend(candidates);
        }
        self.sort_unique(&mut out);
        out
    }

    fn filter(&self, nodes: Vec<XNode<'a>>, predicate: &Expr) -> Vec<XNode<'a>> {
        let size = nodes.len();
        nodes
            .into_iter()
            .enumerate()
            .filter(|(i, node)| {
                let ctx = Context {
                    node: node.clone(),
                    position: i + 1,
                    size,
                };
                match self.eval(predicate, &ctx) {
                    Value::Num(n) => (n - (i + 1) as f64).abs() < f64::EPSILON,
                    other => to_bool(&other),
                }
            })
            .map(|(_, node)| node)
            .collect()
    }

    /// Nodes along `axis`, forward axes in document order and reverse axes nearest first.
    fn axis(&self, context: &XNode<'a>, axis: Axis) -> Vec<XNode<'a>> {
        let node = match context {
            XNode::Node(node) => *node,
            XNode::Attr { owner, .. } => {
                return match axis {
                    Axis::SelfNode => vec![context.clone()],
                    Axis::Parent => vec![XNode::Node(*owner)],
                    Axis::Ancestor => ancestors_inclusive(*owner),
                    Axis::AncestorOrSelf => {
                        let mut nodes = vec![context.clone()];
                        nodes.extend(ancestors_inclusive(*owner));
                        nodes
                    }
                    _ => Vec::new(),
                };
            }
        };

        match axis {
            Axis::Child => node.children().into_iter().map(XNode::Node).collect(),
            Axis::Descendant => node.descendants_it().map(XNode::Node).collect(),
            Axis::DescendantOrSelf => std::iter::once(node)
                .chain(node.descendants_it())
                .map(XNode::Node)
                .collect(),
            Axis::SelfNode => vec![XNode::Node(node)],
            Axis::Parent => node.parent().map(XNode::Node).into_iter().collect(),
            Axis::Ancestor => node.ancestors_it(None).map(XNode::Node).collect(),
            Axis::AncestorOrSelf => ancestors_inclusive(node),
            Axis::FollowingSibling => {
                std::iter::successors(node.next_sibling(), NodeRef::next_sibling)
                    .map(XNode::Node)
                    .collect()
            }
            Axis::PrecedingSibling => {
                std::iter::successors(node.prev_sibling(), NodeRef::prev_sibling)
                    .map(XNode::Node)
                    .collect()
            }
            Axis::Following => {
                let Some(&start) = self.order.get(&node.id) else {
                    return Vec::new();
                };
                let end = start + node.descendants_it().count() + 1;
                self.all
                    .get(end..)
                    .unwrap_or_default()
                    .iter()
                    .copied()
                    .map(XNode::Node)
                    .collect()
            }
            Axis::Preceding => {
                let Some(&start) = self.order.get(&node.id) else {
                    return Vec::new();
                };
                let ancestors: Vec<NodeId> = node.ancestors_it(None).map(|a| a.id).collect();
                self.all[..start]
                    .iter()
                    .rev()
                    .filter(|n| !ancestors.contains(&n.id))
                    .copied()
                    .map(XNode::Node)
                    .collect()
            }
            Axis::Attribute => {
                if !node.is_element() {
                    return Vec::new();
                }
                node.attrs()
                    .into_iter()
                    .enumerate()
                    .map(|(index, attr)| XNode::Attr {
                        owner: node,
                        index,
                        name: attr.name.local.to_ascii_lowercase().to_string(),
                        value: attr.value.to_string(),
                    })
                    .collect()
            }
        }
    }

    fn call(&self, function: Function, args: &[Expr], ctx: &Context<'a>) -> Value<'a> {
        let arg = |i: usize| self.eval(&args[i], ctx);
        let string_arg = |i: usize| {
            if args.len() > i {
                to_string(&arg(i))
            } else {
                ctx.node.string_value()
            }
        };

        match function {
            Function::Last => Value::Num(ctx.size as f64),
            Function::Position => Value::Num(ctx.position as f64),
            Function::Count => match arg(0) {
                Value::Nodes(nodes) => Value::Num(nodes.len() as f64),
                _ => Value::Num(0.0),
            },
            Function::Contains => Value::Bool(to_string(&arg(0)).contains(&to_string(&arg(1)))),
            Function::StartsWith => {
                Value::Bool(to_string(&arg(0)).starts_with(&to_string(&arg(1))))
            }
            Function::NormalizeSpace => Value::Str(normalize_space(&string_arg(0))),
            Function::String => Value::Str(string_arg(0)),
            Function::StringLength => Value::Num(string_arg(0).chars().count() as f64),
            Function::Concat => Value::Str(args.iter().map(|a| to_string(&self.eval(a, ctx))).collect()),
            Function::Substring => {
                let s = to_string(&arg(0));
                let start = xpath_round(to_number(&arg(1)));
                let end = if args.len() > 2 {
                    start + xpath_round(to_number(&arg(2)))
                } else {
                    f64::INFINITY
                };
                Value::Str(
                    s.chars()
                        .enumerate()
                        .filter(|(i, _)| {
                            let p = (i + 1) as f64;
                            p >= start && p < end
                        })
                        .map(|(_, c)| c)
                        .collect(),
                )
            }
            Function::SubstringBefore => {
                let s = to_string(&arg(0));
                let needle = to_string(&arg(1));
                Value::Str(s.find(&needle).map(|i| s[..i].to_string()).unwrap_or_default())
            }
            Function::SubstringAfter => {
                let s = to_string(&arg(0));
                let needle = to_string(&arg(1));
                Value::Str(
                    s.find(&needle)
                        .map(|i| s[i + needle.len()..].to_string())
                        .unwrap_or_default(),
                )
            }
            Function::Translate => {
                let s = to_string(&arg(0));
                let from: Vec<char> = to_string(&arg(1)).chars().collect();
                let to: Vec<char> = to_string(&arg(2)).chars().collect();
                Value::Str(
                    s.chars()
                        .filter_map(|c| match from.iter().position(|&f| f == c) {
                            Some(i) => to.get(i).copied(),
                            None => Some(c),
                        })
                        .collect(),
                )
            }
            Function::Not => Value::Bool(!to_bool(&arg(0))),
            Function::True => Value::Bool(true),
            Function::False => Value::Bool(false),
            Function::Boolean => Value::Bool(to_bool(&arg(0))),
            Function::Number => {
                if args.is_empty() {
                    Value::Num(str_to_number(&ctx.node.string_value()))
                } else {
                    Value::Num(to_number(&arg(0)))
                }
            }
            Function::Name | Function::LocalName => {
                if args.is_empty() {
                    return Value::Str(ctx.node.name());
                }
                match arg(0) {
                    Value::Nodes(nodes) => Value::Str(
                        nodes
                            .iter()
                            .min_by_key(|n| self.key(n))
                            .map(XNode::name)
                            .unwrap_or_default(),
                    ),
                    _ => Value::Str(String::new()),
                }
            }
        }
    }
}

fn ancestors_inclusive(node: NodeRef<'_>) -> Vec<XNode<'_>> {
    std::iter::once(node)
        .chain(node.ancestors_it(None))
        .map(XNode::Node)
        .collect()
}

fn matches_test(node: &XNode<'_>, test: &NodeTest, axis: Axis) -> bool {
    match node {
        XNode::Attr { name, .. } => match test {
            NodeTest::Name(n) => axis == Axis::Attribute && n == name,
            NodeTest::Any | NodeTest::Node => true,
            NodeTest::Text | NodeTest::Comment => false,
        },
        XNode::Node(n) => match test {
            NodeTest::Name(name) => {
                n.is_element()
                    && n.node_name()
                        .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
            }
            NodeTest::Any => n.is_element(),
            NodeTest::Text => n.is_text(),
            NodeTest::Comment => n.is_comment(),
            NodeTest::Node => true,
        },
    }
}

fn xpath_round(n: f64) -> f64 {
    (n + 0.5).floor()
}

fn str_to_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

pub fn to_bool(value: &Value<'_>) -> bool {
    match value {
        Value::Nodes(nodes) => !nodes.is_empty(),
        Value::Str(s) => !s.is_empty(),
        Value::Num(n) => *n != 0.0 && !n.is_nan(),
        Value::Bool(b) => *b,
    }
}

fn to_number(value: &Value<'_>) -> f64 {
    match value {
        Value::Num(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Str(s) => str_to_number(s),
        Value::Nodes(_) => str_to_number(&to_string(value)),
    }
}

fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

fn to_string(value: &Value<'_>) -> String {
    match value {
        // Node-sets handed around internally are already in document order.
        Value::Nodes(nodes) => nodes.first().map(XNode::string_value).unwrap_or_default(),
        Value::Str(s) => s.clone(),
        Value::Num(n) => number_to_string(*n),
        Value::Bool(b) => b.to_string(),
    }
}

fn cmp_numbers(op: CmpOp, a: f64, b: f64) -> bool {
    match op {
        CmpOp::Eq => a == b,
        CmpOp::NotEq => a != b,
        CmpOp::Lt => a < b,
        CmpOp::LtEq => a <= b,
        CmpOp::Gt => a > b,
        CmpOp::GtEq => a >= b,
    }
}

fn cmp_atoms(op: CmpOp, a: &Value<'_>, b: &Value<'_>) -> bool {
    match op {
        CmpOp::Eq | CmpOp::NotEq => {
            let equal = if matches!(a, Value::Bool(_)) || matches!(b, Value::Bool(_)) {
                to_bool(a) == to_bool(b)
            } else if matches!(a, Value::Num(_)) || matches!(b, Value::Num(_)) {
                to_number(a) == to_number(b)
            } else {
                to_string(a) == to_string(b)
            };
            equal == (op == CmpOp::Eq)
        }
        _ => cmp_numbers(op, to_number(a), to_number(b)),
    }
}

fn flip(op: CmpOp) -> CmpOp {
    match op {
        CmpOp::Lt => CmpOp::Gt,
        CmpOp::LtEq => CmpOp::GtEq,
        CmpOp::Gt => CmpOp::Lt,
        CmpOp::GtEq => CmpOp::LtEq,
        same => same,
    }
}

/// Comparisons involving node-sets hold if any member satisfies them.
fn compare(op: CmpOp, a: &Value<'_>, b: &Value<'_>) -> bool {
    match (a, b) {
        (Value::Nodes(left), Value::Nodes(right)) => left.iter().any(|l| {
            let l = Value::Str(l.string_value());
            right
                .iter()
                .any(|r| cmp_node_string(op, &l, &Value::Str(r.string_value())))
        }),
        (Value::Nodes(_), Value::Bool(_)) | (Value::Bool(_), Value::Nodes(_)) => {
            cmp_atoms(op, &Value::Bool(to_bool(a)), &Value::Bool(to_bool(b)))
        }
        (Value::Nodes(nodes), atom) => nodes
            .iter()
            .any(|n| cmp_node_string(op, &Value::Str(n.string_value()), atom)),
        (atom, Value::Nodes(nodes)) => nodes
            .iter()
            .any(|n| cmp_node_string(flip(op), &Value::Str(n.string_value()), atom)),
        _ => cmp_atoms(op, a, b),
    }
}

fn cmp_node_string(op: CmpOp, node_string: &Value<'_>, other: &Value<'_>) -> bool {
    match (op, other) {
        (CmpOp::Eq | CmpOp::NotEq, Value::Num(n)) => {
            let equal = to_number(node_string) == *n;
            equal == (op == CmpOp::Eq)
        }
        (CmpOp::Eq | CmpOp::NotEq, _) => cmp_atoms(op, node_string, &Value::Str(to_string(other))),
        _ => cmp_numbers(op, to_number(node_string), to_number(other)),
    }
}

/// Filters a node-set down to tree nodes in document order.
pub fn into_tree_nodes<'a>(value: Value<'a>) -> Option<Vec<NodeRef<'a>>> {
    match value {
        Value::Nodes(nodes) => Some(nodes.iter().filter_map(XNode::as_node).collect()),
        _ => None,
    }
}
