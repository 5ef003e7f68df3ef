/// Per-call query options
///
/// Built once per request and handed to the compiler; validation of the
/// individual values happens at compile time so that every failure is
/// reported before anything is sent.
use super::fields::FieldSpec;
use super::filter::FilterNode;
use super::lookup::FieldPath;
use crate::error::{Error, Result};
use std::fmt;

/// Largest page size the remote API serves
pub const MAX_PAGE_SIZE: usize = 100;

/// One ordering term; a leading `-` marks descending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    field: FieldPath,
    descending: bool,
}

impl OrderBy {
    /// Parses `"text"` or `"-created_at"`
    pub fn parse(term: &str) -> Result<Self> {
        let term = term.trim();
        let (descending, name) = match term.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, term),
        };
        if name.is_empty() {
            return Err(Error::InvalidOrder(format!(
                "empty field name in order term '{}'",
                term
            )));
        }
        let field = FieldPath::parse(name)
            .map_err(|_| Error::InvalidOrder(format!("'{}' is not a valid field path", term)))?;
        Ok(Self { field, descending })
    }

    /// Parses a comma-separated list such as `"text,-integer"`
    pub fn parse_list(terms: &str) -> Result<Vec<Self>> {
        terms.split(',').map(Self::parse).collect()
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-")?;
        }
        write!(f, "{}", self.field)
    }
}

/// Everything one query call needs besides the target model
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<FilterNode>,
    pub fields: Option<FieldSpec>,
    pub order: Vec<String>,
    pub page: usize,
    pub page_size: Option<usize>,
    pub distinct: bool,
    pub skip_cache: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            filter: None,
            fields: None,
            order: Vec::new(),
            page: 1,
            page_size: None,
            distinct: false,
            skip_cache: false,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_fields(mut self, fields: FieldSpec) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Ordering terms, each optionally prefixed with `-`
    pub fn with_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_skip_cache(mut self, skip_cache: bool) -> Self {
        self.skip_cache = skip_cache;
        self
    }

    /// Parsed ordering terms
    pub fn order_terms(&self) -> Result<Vec<OrderBy>> {
        self.order.iter().map(|term| OrderBy::parse(term)).collect()
    }
}
