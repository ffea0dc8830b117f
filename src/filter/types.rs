use serde_json::Value;

/// Comparison applied to one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Like,
    In,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

impl FilterWhereInfo {
    pub fn new(column: impl Into<String>, operator: FilterOp, data: impl Into<Value>) -> Self {
        Self { column: column.into(), operator, data: data.into() }
    }
}

/// Many-to-many link walked by an EXISTS subquery, e.g. certificate -> tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub link_table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    pub target_table: &'static str,
}

/// One predicate of a WHERE clause. Top-level conditions are ANDed.
#[derive(Debug, Clone)]
pub enum Condition {
    Field(FilterWhereInfo),
    /// OR group, rendered in parentheses
    Any(Vec<FilterWhereInfo>),
    /// Row has at least one related row matching `info`
    Related { relation: Relation, info: FilterWhereInfo },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// Property names a resource may be sorted by, mapped to their columns
pub type SortWhitelist = &'static [(&'static str, &'static str)];

#[derive(Debug, Clone, Default)]
pub struct FilterData {
    pub conditions: Vec<Condition>,
    pub order: Vec<FilterOrderInfo>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
