/// Query compiler
///
/// Turns [`QueryOptions`] into the exact parameter set of the remote query
/// endpoint. Lookups become flat `field__operator` keys, OR and NOT groups
/// become nested `or`/`not` structures, and the projection, ordering and
/// paging options are passed alongside.
use super::filter::FilterNode;
use super::lookup::GROUP_KEYWORDS;
use super::options::{QueryOptions, MAX_PAGE_SIZE};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, trace};

/// Parameter names the compiler emits next to the filter keys
pub const RESERVED_PARAMS: [&str; 6] = [
    "fields",
    "order",
    "page",
    "page_size",
    "distinct",
    "skip_cache",
];

/// Compiled wire parameters, sorted by key at every nesting level
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryParams {
    params: BTreeMap<String, Value>,
}

impl QueryParams {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Replaces one pass-through parameter (used when paging through results)
    pub fn set(&mut self, key: &str, value: Value) {
        self.params.insert(key.to_string(), value);
    }

    /// The parameters as one JSON object (the request body)
    pub fn to_json(&self) -> Value {
        to_object(&self.params)
    }

    /// Stable single-line serialization, suitable as a cache key
    pub fn canonical_string(&self) -> String {
        self.to_json().to_string()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.params
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

/// Compiles query options into wire parameters
#[derive(Debug, Clone)]
pub struct Compiler {
    max_page_size: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiler for a server configured with a smaller page cap
    pub fn with_max_page_size(max_page_size: usize) -> Self {
        Self {
            max_page_size: max_page_size.min(MAX_PAGE_SIZE),
        }
    }

    /// Compile a full set of query options
    pub fn compile(&self, options: &QueryOptions) -> Result<QueryParams> {
        let mut params = match options.filter {
            Some(ref filter) => compile_filter(filter)?,
            None => BTreeMap::new(),
        };

        for key in params.keys() {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                return Err(Error::FilterConflict { key: key.clone() });
            }
        }

        if let Some(ref fields) = options.fields {
            params.insert("fields".to_string(), fields.to_wire());
        }

        let order = options.order_terms()?;
        if !order.is_empty() {
            let joined = order
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.insert("order".to_string(), Value::String(joined));
        }

        if options.page == 0 {
            return Err(Error::InvalidPagination {
                name: "page",
                value: 0,
            });
        }
        params.insert("page".to_string(), Value::from(options.page));

        if let Some(page_size) = options.page_size {
            self.check_page_size(page_size)?;
            params.insert("page_size".to_string(), Value::from(page_size));
        }

        params.insert("distinct".to_string(), Value::Bool(options.distinct));
        params.insert("skip_cache".to_string(), Value::Bool(options.skip_cache));

        let params = QueryParams { params };
        debug!(params = %params, "compiled query");
        Ok(params)
    }

    fn check_page_size(&self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(Error::InvalidPagination {
                name: "page_size",
                value: 0,
            });
        }
        if page_size > self.max_page_size {
            return Err(Error::PageSizeExceeded {
                requested: page_size,
                max: self.max_page_size,
            });
        }
        Ok(())
    }
}

/// Compile options with the default compiler
pub fn compile(options: &QueryOptions) -> Result<QueryParams> {
    Compiler::new().compile(options)
}

/// Compile a filter tree on its own. The tree is canonicalized first so
/// that equivalent trees produce identical parameters.
pub fn compile_filter(filter: &FilterNode) -> Result<BTreeMap<String, Value>> {
    compile_node(&filter.canonical())
}

fn compile_node(node: &FilterNode) -> Result<BTreeMap<String, Value>> {
    match node {
        FilterNode::Leaf(lookup) => {
            let mut params = BTreeMap::new();
            params.insert(lookup.wire_key(), lookup.wire_value());
            Ok(params)
        }
        FilterNode::And(children) => compile_and(children),
        FilterNode::Or(children) => {
            if children.is_empty() {
                return Err(Error::InvalidFilterGroup {
                    group: "or".to_string(),
                    reason: "group is empty".to_string(),
                });
            }
            let compiled = children
                .iter()
                .map(|child| compile_node(child).map(|p| to_object(&p)))
                .collect::<Result<Vec<_>>>()?;
            Ok(single("or", Value::Array(compiled)))
        }
        FilterNode::Not(inner) => {
            let compiled = compile_node(inner)?;
            if compiled.is_empty() {
                return Err(Error::InvalidFilterGroup {
                    group: "not".to_string(),
                    reason: "nothing to negate".to_string(),
                });
            }
            Ok(single("not", to_object(&compiled)))
        }
    }
}

/// AND children share one flat mapping. Two lookups landing on the same key
/// cannot be told apart there, so that is a conflict. Repeated `or`/`not`
/// groups are moved into an `and` list instead of overwriting each other;
/// that list is sorted by its JSON text so child order never reaches the wire.
fn compile_and(children: &[FilterNode]) -> Result<BTreeMap<String, Value>> {
    let mut params: BTreeMap<String, Value> = BTreeMap::new();
    let mut nested: Vec<Value> = Vec::new();
    let mut moved: HashSet<String> = HashSet::new();

    for child in children {
        for (key, value) in compile_node(child)? {
            if key == "and" {
                if let Value::Array(items) = value {
                    nested.extend(items);
                }
                continue;
            }

            if GROUP_KEYWORDS.contains(&key.as_str()) {
                if let Some(previous) = params.remove(&key) {
                    trace!(group = %key, "repeated group in AND, nesting");
                    nested.push(to_object(&single(&key, previous)));
                    nested.push(to_object(&single(&key, value)));
                    moved.insert(key);
                } else if moved.contains(&key) {
                    nested.push(to_object(&single(&key, value)));
                } else {
                    params.insert(key, value);
                }
                continue;
            }

            if params.contains_key(&key) {
                return Err(Error::FilterConflict { key });
            }
            params.insert(key, value);
        }
    }

    if !nested.is_empty() {
        nested.sort_by_cached_key(Value::to_string);
        params.insert("and".to_string(), Value::Array(nested));
    }
    Ok(params)
}

fn single(key: &str, value: Value) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();
    map.insert(key.to_string(), value);
    map
}

fn to_object(params: &BTreeMap<String, Value>) -> Value {
    let map: Map<String, Value> = params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fields::FieldSpec;
    use crate::query::filter::Q;
    use serde_json::json;

    fn filter_params(filter: FilterNode) -> Value {
        to_object(&compile_filter(&filter).unwrap())
    }

    fn q(key: &str, value: impl Into<Value>) -> FilterNode {
        Q::lookup(key, value).unwrap()
    }

    #[test]
    fn test_three_forms_compile_identically() {
        let expected = json!({
            "or": [
                {"question__startswith": "Who"},
                {"integer__gte": 1, "question__startswith": "What"}
            ]
        });

        let mapping = FilterNode::from_mapping(&json!({
            "or": [
                {"question__startswith": "Who"},
                {"question__startswith": "What", "integer__gte": 1}
            ]
        }))
        .unwrap();
        let builder = q("question__startswith", "Who")
            | (q("question__startswith", "What") & q("integer__gte", 1));
        let text = FilterNode::from_text(
            "or:\n- question__startswith: Who\n- question__startswith: What\n  integer__gte: 1\n",
        )
        .unwrap();

        let a = filter_params(mapping);
        let b = filter_params(builder);
        let c = filter_params(text);
        assert_eq!(a, expected);
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(b.to_string(), c.to_string());
    }

    #[test]
    fn test_leaf_keys() {
        assert_eq!(filter_params(q("id__exact", 3)), json!({"id": 3}));
        assert_eq!(
            filter_params(q("author__name__icontains", "ann")),
            json!({"author__name__icontains": "ann"})
        );
        assert_eq!(
            filter_params(q("id__in", json!([1, 2, 3]))),
            json!({"id__in": "1,2,3"})
        );
    }

    #[test]
    fn test_and_conflict() {
        let filter = q("id__gte", 1) & q("id__gte", 5);
        let err = compile_filter(&filter).unwrap_err();
        match err {
            Error::FilterConflict { key } => assert_eq!(key, "id__gte"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_and_different_operators_merge() {
        assert_eq!(
            filter_params(q("id__gte", 1) & q("id__lte", 5)),
            json!({"id__gte": 1, "id__lte": 5})
        );
    }

    #[test]
    fn test_and_is_commutative_on_the_wire() {
        let ab = filter_params(q("a", 1) & q("b", 2));
        let ba = filter_params(q("b", 2) & q("a", 1));
        assert_eq!(ab.to_string(), ba.to_string());
    }

    #[test]
    fn test_double_not() {
        assert_eq!(
            filter_params(!!q("id", 1)),
            json!({"not": {"not": {"id": 1}}})
        );
    }

    #[test]
    fn test_not_inside_and() {
        assert_eq!(
            filter_params(!q("field1", 1) & q("field2", 2)),
            json!({"field2": 2, "not": {"field1": 1}})
        );
    }

    #[test]
    fn test_repeated_groups_are_nested() {
        let filter = (q("a", 1) | q("b", 2)) & (q("c", 3) | q("d", 4)) & q("e", 5);
        assert_eq!(
            filter_params(filter),
            json!({
                "and": [
                    {"or": [{"a": 1}, {"b": 2}]},
                    {"or": [{"c": 3}, {"d": 4}]}
                ],
                "e": 5
            })
        );
    }

    #[test]
    fn test_nested_groups_ignore_child_order() {
        let ab_cd = filter_params((q("a", 1) | q("b", 2)) & (q("c", 3) | q("d", 4)));
        let cd_ab = filter_params((q("c", 3) | q("d", 4)) & (q("a", 1) | q("b", 2)));
        assert_eq!(ab_cd.to_string(), cd_ab.to_string());

        let nots = filter_params(!q("x", 1) & !q("w", 2));
        assert_eq!(
            nots,
            json!({"and": [{"not": {"w": 2}}, {"not": {"x": 1}}]})
        );
    }

    #[test]
    fn test_negating_everything_is_rejected() {
        let err = compile_filter(&!Q::all()).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterGroup { ref group, .. } if group == "not"));
        assert!(compile_node(&FilterNode::Not(Box::new(FilterNode::And(vec![])))).is_err());
    }

    #[test]
    fn test_deep_nesting_without_canonicalization() {
        let tree = FilterNode::And(vec![FilterNode::And(vec![FilterNode::Or(vec![
            FilterNode::And(vec![q("a", 1)]),
            FilterNode::Not(Box::new(FilterNode::And(vec![q("b", 2), q("c", 3)]))),
        ])])]);
        let raw = to_object(&compile_node(&tree).unwrap());
        assert_eq!(raw, filter_params(tree));
        assert_eq!(
            raw,
            json!({"or": [{"a": 1}, {"not": {"b": 2, "c": 3}}]})
        );
    }

    #[test]
    fn test_empty_or_is_rejected() {
        assert!(matches!(
            compile_node(&FilterNode::Or(vec![])),
            Err(Error::InvalidFilterGroup { .. })
        ));
    }

    #[test]
    fn test_full_options() {
        let options = QueryOptions::new()
            .with_filter(q("integer__gte", 1))
            .with_fields(FieldSpec::from_value(&json!(["id", {"text": "body"}])).unwrap())
            .with_order(["text", "-id"])
            .with_page(2)
            .with_page_size(50)
            .with_distinct(true);
        let params = compile(&options).unwrap();
        assert_eq!(
            params.to_json(),
            json!({
                "distinct": true,
                "fields": ["id", {"text": "body"}],
                "integer__gte": 1,
                "order": "text,-id",
                "page": 2,
                "page_size": 50,
                "skip_cache": false
            })
        );
    }

    #[test]
    fn test_page_size_cap() {
        let err = compile(&QueryOptions::new().with_page_size(500)).unwrap_err();
        assert!(matches!(
            err,
            Error::PageSizeExceeded {
                requested: 500,
                max: 100
            }
        ));
        assert!(compile(&QueryOptions::new().with_page_size(100)).is_ok());
        assert!(matches!(
            Compiler::with_max_page_size(20).compile(&QueryOptions::new().with_page_size(21)),
            Err(Error::PageSizeExceeded { max: 20, .. })
        ));
    }

    #[test]
    fn test_zero_pagination() {
        assert!(matches!(
            compile(&QueryOptions::new().with_page(0)),
            Err(Error::InvalidPagination { name: "page", .. })
        ));
        assert!(matches!(
            compile(&QueryOptions::new().with_page_size(0)),
            Err(Error::InvalidPagination {
                name: "page_size",
                ..
            })
        ));
    }

    #[test]
    fn test_filter_on_reserved_name() {
        let options = QueryOptions::new().with_filter(q("order", "x"));
        assert!(matches!(
            compile(&options),
            Err(Error::FilterConflict { ref key }) if key == "order"
        ));
    }

    #[test]
    fn test_defaults_only() {
        let params = compile(&QueryOptions::new()).unwrap();
        assert_eq!(
            params.to_json(),
            json!({"distinct": false, "page": 1, "skip_cache": false})
        );
        assert_eq!(
            params.canonical_string(),
            r#"{"distinct":false,"page":1,"skip_cache":false}"#
        );
    }
}
