//! Query editing state as the canvas sees it: selected fields, their filter
//! slots, and the join list.
//!
//! Serialized shapes are camelCase so a saved query round-trips through the
//! same JSON the canvas persists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::QueryCanvasError;

/// Number of filter slots (OR-groups) each field carries.
pub const FILTER_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregation {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl Aggregation {
    pub const ALL: [Aggregation; 5] = [
        Aggregation::Sum,
        Aggregation::Avg,
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Count,
    ];

    pub fn as_sql(&self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Avg => "AVG",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Count => "COUNT",
        }
    }

    /// Aggregations whose result is numeric regardless of the input column type.
    pub fn yields_number(&self) -> bool {
        matches!(self, Aggregation::Sum | Aggregation::Avg | Aggregation::Count)
    }
}

impl FromStr for Aggregation {
    type Err = QueryCanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregation::ALL
            .into_iter()
            .find(|a| a.as_sql().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QueryCanvasError::Validation(format!("unknown aggregation '{s}'")))
    }
}

/// Role a field plays once grouping is switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GroupByType {
    #[default]
    GroupBy,
    /// Filter-only: the field feeds WHERE but is never projected.
    Where,
    Aggregate(Aggregation),
    Expression,
}

impl GroupByType {
    pub fn aggregation(&self) -> Option<Aggregation> {
        match self {
            GroupByType::Aggregate(agg) => Some(*agg),
            _ => None,
        }
    }

    /// Aggregated or expression fields may carry a HAVING predicate.
    pub fn accepts_having(&self) -> bool {
        matches!(self, GroupByType::Aggregate(_) | GroupByType::Expression)
    }
}

impl fmt::Display for GroupByType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupByType::GroupBy => f.write_str("Group By"),
            GroupByType::Where => f.write_str("Where"),
            GroupByType::Aggregate(agg) => f.write_str(agg.as_sql()),
            GroupByType::Expression => f.write_str("Expression"),
        }
    }
}

impl FromStr for GroupByType {
    type Err = QueryCanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "Group By" => Ok(GroupByType::GroupBy),
            "Where" => Ok(GroupByType::Where),
            "Expression" => Ok(GroupByType::Expression),
            other => other.parse().map(GroupByType::Aggregate),
        }
    }
}

impl Serialize for GroupByType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GroupByType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    NeqAlt,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    ILike,
    NotILike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    /// Raw SQL fragment appended after the column reference.
    Sql,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
            Operator::NeqAlt => "<>",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotILike => "NOT ILIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Sql => "SQL",
        }
    }

    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Operator::Like | Operator::NotLike | Operator::ILike | Operator::NotILike
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

const OPERATORS: [Operator; 16] = [
    Operator::Eq,
    Operator::Neq,
    Operator::NeqAlt,
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::Like,
    Operator::NotLike,
    Operator::ILike,
    Operator::NotILike,
    Operator::In,
    Operator::NotIn,
    Operator::IsNull,
    Operator::IsNotNull,
    Operator::Sql,
];

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = QueryCanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OPERATORS
            .into_iter()
            .find(|op| op.as_sql().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| QueryCanvasError::Validation(format!("unknown operator '{s}'")))
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_sql())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortDirection {
    type Err = QueryCanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            other => Err(QueryCanvasError::Validation(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

/// One filter slot. An unset operator means the slot is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(with = "empty_as_none", default)]
    pub op: Option<Operator>,
    #[serde(default)]
    pub val: String,
}

impl FilterState {
    pub fn new(op: Operator, val: impl Into<String>) -> Self {
        Self {
            op: Some(op),
            val: val.into(),
        }
    }

    pub fn is_set(&self) -> bool {
        self.op.is_some()
    }
}

fn default_filters() -> Vec<FilterState> {
    vec![FilterState::default(); FILTER_SLOTS]
}

fn default_visible() -> bool {
    true
}

/// A column (or custom expression) placed on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiField {
    pub id: String,
    pub table: String,
    pub column: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    pub group_by_type: GroupByType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default = "default_filters")]
    pub filters: Vec<FilterState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<FilterState>,
    #[serde(with = "empty_as_none", default)]
    pub sort_dir: Option<SortDirection>,
}

impl UiField {
    pub fn new(id: impl Into<String>, table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            table: table.into(),
            column: column.into(),
            alias: String::new(),
            is_visible: true,
            group_by_type: GroupByType::GroupBy,
            expression: None,
            filters: default_filters(),
            having: None,
            sort_dir: None,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        let alias = self.alias.trim();
        (!alias.is_empty()).then_some(alias)
    }

    /// Filter slot `idx`, if set.
    pub fn filter(&self, idx: usize) -> Option<&FilterState> {
        self.filters.get(idx).filter(|f| f.is_set())
    }

    pub fn set_filter(&mut self, idx: usize, filter: FilterState) {
        if self.filters.len() <= idx {
            self.filters.resize(idx + 1, FilterState::default());
        }
        self.filters[idx] = filter;
    }

    pub fn having(&self) -> Option<&FilterState> {
        self.having.as_ref().filter(|h| h.is_set())
    }

    /// Non-blank expression text.
    pub fn expression(&self) -> Option<&str> {
        self.expression
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JoinType {
    #[default]
    #[serde(rename = "INNER JOIN")]
    Inner,
    #[serde(rename = "LEFT JOIN")]
    Left,
    #[serde(rename = "RIGHT JOIN")]
    Right,
    #[serde(rename = "FULL JOIN")]
    Full,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
        }
    }

    /// Type to use once the clause's two sides are swapped.
    pub fn flipped(self) -> Self {
        match self {
            JoinType::Left => JoinType::Right,
            JoinType::Right => JoinType::Left,
            other => other,
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `table2` is joined onto the already-defined `table1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinClause {
    pub id: String,
    #[serde(rename = "type")]
    pub join_type: JoinType,
    pub table1: String,
    pub column1: String,
    pub table2: String,
    pub column2: String,
    #[serde(default)]
    pub is_auto: bool,
}

impl JoinClause {
    /// Auto-generated INNER JOIN with an id derived from its columns.
    pub fn auto(
        table1: impl Into<String>,
        column1: impl Into<String>,
        table2: impl Into<String>,
        column2: impl Into<String>,
    ) -> Self {
        let (table1, column1, table2, column2) =
            (table1.into(), column1.into(), table2.into(), column2.into());
        Self {
            id: format!("auto:{table1}.{column1}:{table2}.{column2}"),
            join_type: JoinType::Inner,
            table1,
            column1,
            table2,
            column2,
            is_auto: true,
        }
    }

    /// Same table pair, in either orientation.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.table1 == a && self.table2 == b) || (self.table1 == b && self.table2 == a)
    }

    pub fn same_pair(&self, other: &JoinClause) -> bool {
        self.connects(&other.table1, &other.table2)
    }

    /// Swap sides, keeping the join semantics.
    pub fn reversed(&self) -> Self {
        Self {
            id: self.id.clone(),
            join_type: self.join_type.flipped(),
            table1: self.table2.clone(),
            column1: self.column2.clone(),
            table2: self.table1.clone(),
            column2: self.column1.clone(),
            is_auto: self.is_auto,
        }
    }
}

fn default_filter_group_count() -> usize {
    1
}

/// Full serializable snapshot of query-editing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQueryState {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub joins: Vec<JoinClause>,
    #[serde(default)]
    pub fields: Vec<UiField>,
    #[serde(default)]
    pub is_group_by_active: bool,
    #[serde(default = "default_filter_group_count")]
    pub filter_group_count: usize,
}

impl Default for SavedQueryState {
    fn default() -> Self {
        Self {
            from: String::new(),
            joins: Vec::new(),
            fields: Vec::new(),
            is_group_by_active: false,
            filter_group_count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: String,
    pub name: String,
    pub state: SavedQueryState,
}

/// `""` on the wire stands for "not set".
mod empty_as_none {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: Display, S: Serializer>(
        value: &Option<T>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}
