/// Filter expression tree
///
/// A filter is a finite tree of AND/OR/NOT groups over [`FieldLookup`]
/// leaves. Trees are values: every combinator returns a new node and leaves
/// its operands untouched, so one expression can be reused across queries.
use super::lookup::FieldLookup;
use crate::error::Result;
use serde_json::Value;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Composable boolean filter expression
#[derive(Debug, Clone)]
pub enum FilterNode {
    /// A single field comparison
    Leaf(FieldLookup),
    /// All children must match; an empty AND matches everything
    And(Vec<FilterNode>),
    /// At least one child must match
    Or(Vec<FilterNode>),
    /// Negation of exactly one expression
    Not(Box<FilterNode>),
}

/// Keyword-style builder name, e.g. `Q::lookup("integer__gte", 1)? | Q::lookup("id", 2)?`
pub type Q = FilterNode;

impl FilterNode {
    /// The empty filter. Combining anything with it yields the other operand.
    pub fn all() -> Self {
        FilterNode::And(Vec::new())
    }

    /// Single lookup from a `field[__relation...][__operator]` key
    pub fn lookup(key: &str, value: impl Into<Value>) -> Result<Self> {
        FieldLookup::parse(key, value).map(FilterNode::Leaf)
    }

    /// Single lookup with an explicitly named operator
    pub fn with_operator(path: &str, operator: &str, value: impl Into<Value>) -> Result<Self> {
        FieldLookup::with_operator(path, operator, value).map(FilterNode::Leaf)
    }

    /// Several keyword lookups at once; they are AND-ed in the given order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut leaves = pairs
            .into_iter()
            .map(|(key, value)| Self::lookup(key.as_ref(), value))
            .collect::<Result<Vec<_>>>()?;
        Ok(match leaves.len() {
            1 => leaves.remove(0),
            _ => FilterNode::And(leaves),
        })
    }

    /// `self AND other`
    pub fn and(self, other: FilterNode) -> FilterNode {
        self.combine(other, FilterNode::And)
    }

    /// `self OR other`
    pub fn or(self, other: FilterNode) -> FilterNode {
        self.combine(other, FilterNode::Or)
    }

    /// `NOT self`. Negation is kept as an explicit wrapper and never pushed
    /// down into the operand.
    pub fn negate(self) -> FilterNode {
        FilterNode::Not(Box::new(self))
    }

    fn combine(self, other: FilterNode, group: fn(Vec<FilterNode>) -> FilterNode) -> FilterNode {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        group(vec![self, other])
    }

    /// `true` for an AND group with no children
    pub fn is_empty(&self) -> bool {
        matches!(self, FilterNode::And(children) if children.is_empty())
    }

    /// Returns the canonical form of this tree.
    ///
    /// AND groups nested in AND groups (and OR in OR) are spliced into their
    /// parent, single-child AND/OR groups are replaced by their child, and
    /// empty AND groups disappear (also as OR branches). NOT nodes are preserved as written, so a
    /// double negation stays a double negation.
    pub fn canonical(&self) -> FilterNode {
        match self {
            FilterNode::Leaf(lookup) => FilterNode::Leaf(lookup.clone()),
            FilterNode::And(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.canonical() {
                        FilterNode::And(grandchildren) => flat.extend(grandchildren),
                        other => flat.push(other),
                    }
                }
                collapse(flat, FilterNode::And)
            }
            FilterNode::Or(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.canonical() {
                        FilterNode::Or(grandchildren) => flat.extend(grandchildren),
                        // an empty branch is the identity, as in `combine`
                        c if c.is_empty() => {}
                        other => flat.push(other),
                    }
                }
                if flat.is_empty() {
                    return FilterNode::all();
                }
                collapse(flat, FilterNode::Or)
            }
            FilterNode::Not(inner) => FilterNode::Not(Box::new(inner.canonical())),
        }
    }

    /// All lookups in the tree, depth first
    pub fn leaves(&self) -> Vec<&FieldLookup> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FieldLookup>) {
        match self {
            FilterNode::Leaf(lookup) => out.push(lookup),
            FilterNode::And(children) | FilterNode::Or(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            FilterNode::Not(inner) => inner.collect_leaves(out),
        }
    }
}

fn collapse(mut children: Vec<FilterNode>, group: fn(Vec<FilterNode>) -> FilterNode) -> FilterNode {
    if children.len() == 1 {
        children.remove(0)
    } else {
        group(children)
    }
}

fn same_shape(a: &FilterNode, b: &FilterNode) -> bool {
    match (a, b) {
        (FilterNode::Leaf(x), FilterNode::Leaf(y)) => x == y,
        (FilterNode::And(xs), FilterNode::And(ys)) | (FilterNode::Or(xs), FilterNode::Or(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_shape(x, y))
        }
        (FilterNode::Not(x), FilterNode::Not(y)) => same_shape(x, y),
        _ => false,
    }
}

/// Two filters are equal when their canonical forms are structurally equal.
impl PartialEq for FilterNode {
    fn eq(&self, other: &Self) -> bool {
        same_shape(&self.canonical(), &other.canonical())
    }
}

impl BitAnd for FilterNode {
    type Output = FilterNode;

    fn bitand(self, rhs: FilterNode) -> FilterNode {
        self.and(rhs)
    }
}

impl BitAnd for &FilterNode {
    type Output = FilterNode;

    fn bitand(self, rhs: &FilterNode) -> FilterNode {
        self.clone().and(rhs.clone())
    }
}

impl BitOr for FilterNode {
    type Output = FilterNode;

    fn bitor(self, rhs: FilterNode) -> FilterNode {
        self.or(rhs)
    }
}

impl BitOr for &FilterNode {
    type Output = FilterNode;

    fn bitor(self, rhs: &FilterNode) -> FilterNode {
        self.clone().or(rhs.clone())
    }
}

impl Not for FilterNode {
    type Output = FilterNode;

    fn not(self) -> FilterNode {
        self.negate()
    }
}

impl Not for &FilterNode {
    type Output = FilterNode;

    fn not(self) -> FilterNode {
        self.clone().negate()
    }
}

impl From<FieldLookup> for FilterNode {
    fn from(lookup: FieldLookup) -> Self {
        FilterNode::Leaf(lookup)
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Leaf(lookup) => write!(f, "{}", lookup),
            FilterNode::And(children) | FilterNode::Or(children) => {
                let sep = if matches!(self, FilterNode::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            FilterNode::Not(inner) => write!(f, "NOT {}", inner),
        }
    }
}
