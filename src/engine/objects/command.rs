//! Resolved commands handed to the rewriter.
use std::fmt::{self, Display, Formatter};

use super::expression::display_list;
use super::types::DataType;
use super::{Block, Criteria, ElementSymbol, Expression};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Query(Query),
    SetQuery(SetQuery),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    StoredProcedure(StoredProcedure),
    Dynamic(DynamicCommand),
}

/// Planner hints that survive procedure unwrapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandOptions {
    pub no_cache: bool,
    pub make_dep: Vec<String>,
    pub make_not_dep: Vec<String>,
}

impl CommandOptions {
    pub fn is_empty(&self) -> bool {
        !self.no_cache && self.make_dep.is_empty() && self.make_not_dep.is_empty()
    }

    pub fn merge(&mut self, other: &CommandOptions) {
        self.no_cache |= other.no_cache;
        for g in &other.make_dep {
            if !self.make_dep.contains(g) {
                self.make_dep.push(g.clone());
            }
        }
        for g in &other.make_not_dep {
            if !self.make_not_dep.contains(g) {
                self.make_not_dep.push(g.clone());
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Select {
    pub distinct: bool,
    pub symbols: Vec<Expression>,
}

impl Select {
    pub fn new(symbols: Vec<Expression>) -> Select {
        Select {
            distinct: false,
            symbols,
        }
    }

    pub fn projected_types(&self) -> Vec<DataType> {
        self.symbols.iter().map(|s| s.data_type()).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupSymbol {
    /// Name the group is referenced by in this command
    pub name: String,
    /// Underlying group when `name` is an alias
    pub definition: Option<String>,
}

impl GroupSymbol {
    pub fn new(name: &str) -> GroupSymbol {
        GroupSymbol {
            name: name.to_string(),
            definition: None,
        }
    }

    pub fn aliased(name: &str, definition: &str) -> GroupSymbol {
        GroupSymbol {
            name: name.to_string(),
            definition: Some(definition.to_string()),
        }
    }

    /// The name metadata knows this group by.
    pub fn metadata_name(&self) -> &str {
        self.definition.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinType {
    Inner,
    Cross,
    LeftOuter,
    RightOuter,
    FullOuter,
    /// Legacy UNION JOIN, every row of both sides with nothing matched
    Union,
}

impl JoinType {
    pub fn name(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Cross => "CROSS JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
            JoinType::FullOuter => "FULL OUTER JOIN",
            JoinType::Union => "UNION JOIN",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JoinPredicate {
    pub left: Box<FromClause>,
    pub join_type: JoinType,
    pub right: Box<FromClause>,
    pub criteria: Vec<Criteria>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubqueryFromClause {
    pub name: String,
    pub command: Box<Command>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FromClause {
    Table(GroupSymbol),
    Join(JoinPredicate),
    Subquery(SubqueryFromClause),
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderByItem {
    pub expression: Expression,
    pub ascending: bool,
    /// Position in the projection once the order by has been finalized
    pub position: Option<usize>,
}

impl OrderByItem {
    pub fn new(expression: Expression, ascending: bool) -> OrderByItem {
        OrderByItem {
            expression,
            ascending,
            position: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderBy {
    pub items: Vec<OrderByItem>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Limit {
    pub offset: Option<Expression>,
    pub row_limit: Option<Expression>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub select: Select,
    pub from: Vec<FromClause>,
    pub criteria: Option<Criteria>,
    pub group_by: Vec<Expression>,
    pub having: Option<Criteria>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
    /// Target group of SELECT ... INTO
    pub into: Option<GroupSymbol>,
    pub options: CommandOptions,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetOperation {
    Union,
    Intersect,
    Except,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetQuery {
    pub operation: SetOperation,
    pub all: bool,
    pub left: Box<Command>,
    pub right: Box<Command>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
    /// Common branch types computed by the resolver, when they had to be widened
    pub projected_types: Option<Vec<DataType>>,
    pub options: CommandOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InsertSource {
    Values(Vec<Expression>),
    Query(Box<Command>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Insert {
    pub group: GroupSymbol,
    pub columns: Vec<ElementSymbol>,
    pub source: InsertSource,
    pub options: CommandOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetClause {
    pub symbol: ElementSymbol,
    pub value: Expression,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    pub group: GroupSymbol,
    pub changes: Vec<SetClause>,
    pub criteria: Option<Criteria>,
    pub options: CommandOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delete {
    pub group: GroupSymbol,
    pub criteria: Option<Criteria>,
    pub options: CommandOptions,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParameterDirection {
    In,
    InOut,
    Out,
    ReturnValue,
    ResultSet,
}

impl ParameterDirection {
    pub fn is_input(&self) -> bool {
        matches!(self, ParameterDirection::In | ParameterDirection::InOut)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcedureParameter {
    /// Declared position, starting at 1
    pub index: usize,
    pub name: String,
    pub expression: Option<Expression>,
    pub direction: ParameterDirection,
    pub data_type: DataType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredProcedure {
    pub name: String,
    pub params: Vec<ProcedureParameter>,
    /// Parameters were supplied as name => value
    pub display_named: bool,
    /// Called from a FROM clause or otherwise consumed as a relation
    pub relational: bool,
    /// Definition of a virtual procedure
    pub body: Option<Block>,
    /// Criteria of the user command a HAS or TRANSLATE inspects
    pub user_criteria: Option<Criteria>,
    pub options: CommandOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DynamicCommand {
    pub sql: Expression,
    pub into: Option<GroupSymbol>,
}

impl Command {
    pub fn options(&self) -> Option<&CommandOptions> {
        match self {
            Command::Query(q) => Some(&q.options),
            Command::SetQuery(s) => Some(&s.options),
            Command::Insert(i) => Some(&i.options),
            Command::Update(u) => Some(&u.options),
            Command::Delete(d) => Some(&d.options),
            Command::StoredProcedure(p) => Some(&p.options),
            Command::Dynamic(_) => None,
        }
    }

    pub fn options_mut(&mut self) -> Option<&mut CommandOptions> {
        match self {
            Command::Query(q) => Some(&mut q.options),
            Command::SetQuery(s) => Some(&mut s.options),
            Command::Insert(i) => Some(&mut i.options),
            Command::Update(u) => Some(&mut u.options),
            Command::Delete(d) => Some(&mut d.options),
            Command::StoredProcedure(p) => Some(&mut p.options),
            Command::Dynamic(_) => None,
        }
    }

    /// Projected types of a query shaped command.
    pub fn projected_types(&self) -> Vec<DataType> {
        match self {
            Command::Query(q) => q.select.projected_types(),
            Command::SetQuery(s) => match &s.projected_types {
                Some(t) => t.clone(),
                None => s.left.projected_types(),
            },
            _ => vec![],
        }
    }

    /// Output names of a query shaped command, positional for unnamed expressions.
    pub fn projected_names(&self) -> Vec<String> {
        match self {
            Command::Query(q) => q
                .select
                .symbols
                .iter()
                .enumerate()
                .map(|(i, s)| match s.output_name() {
                    Some(n) => n.to_string(),
                    None => format!("expr{}", i + 1),
                })
                .collect(),
            Command::SetQuery(s) => s.left.projected_names(),
            _ => vec![],
        }
    }
}

impl Display for GroupSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.definition {
            Some(d) => write!(f, "{} AS {}", d, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl Display for FromClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FromClause::Table(g) => write!(f, "{}", g),
            FromClause::Join(j) => {
                write!(f, "{} {} {}", j.left, j.join_type.name(), j.right)?;
                if !j.criteria.is_empty() {
                    let parts: Vec<String> = j.criteria.iter().map(|c| c.to_string()).collect();
                    write!(f, " ON {}", parts.join(" AND "))?;
                }
                Ok(())
            }
            FromClause::Subquery(s) => write!(f, "({}) AS {}", s.command, s.name),
        }
    }
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .items
            .iter()
            .map(|i| {
                if i.ascending {
                    i.expression.to_string()
                } else {
                    format!("{} DESC", i.expression)
                }
            })
            .collect();
        write!(f, "ORDER BY {}", parts.join(", "))
    }
}

impl Display for Limit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (&self.offset, &self.row_limit) {
            (Some(o), Some(r)) => write!(f, "LIMIT {}, {}", o, r),
            (None, Some(r)) => write!(f, "LIMIT {}", r),
            (Some(o), None) => write!(f, "OFFSET {} ROWS", o),
            (None, None) => Ok(()),
        }
    }
}

impl Display for CommandOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "OPTION")?;
        if !self.make_dep.is_empty() {
            write!(f, " MAKEDEP {}", self.make_dep.join(", "))?;
        }
        if !self.make_not_dep.is_empty() {
            write!(f, " MAKENOTDEP {}", self.make_not_dep.join(", "))?;
        }
        if self.no_cache {
            write!(f, " NOCACHE")?;
        }
        Ok(())
    }
}

fn write_options(f: &mut Formatter<'_>, options: &CommandOptions) -> fmt::Result {
    if options.is_empty() {
        return Ok(());
    }
    write!(f, " {}", options)
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.select.distinct {
            write!(f, "DISTINCT ")?;
        }
        write!(f, "{}", display_list(&self.select.symbols))?;
        if let Some(into) = &self.into {
            write!(f, " INTO {}", into)?;
        }
        if !self.from.is_empty() {
            write!(f, " FROM {}", display_list(&self.from))?;
        }
        if let Some(c) = &self.criteria {
            write!(f, " WHERE {}", c)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", display_list(&self.group_by))?;
        }
        if let Some(h) = &self.having {
            write!(f, " HAVING {}", h)?;
        }
        if let Some(o) = &self.order_by {
            write!(f, " {}", o)?;
        }
        if let Some(l) = &self.limit {
            write!(f, " {}", l)?;
        }
        write_options(f, &self.options)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Command::Query(q) => write!(f, "{}", q),
            Command::SetQuery(s) => {
                let op = match s.operation {
                    SetOperation::Union => "UNION",
                    SetOperation::Intersect => "INTERSECT",
                    SetOperation::Except => "EXCEPT",
                };
                let all = if s.all { " ALL" } else { "" };
                write!(f, "{} {}{} {}", s.left, op, all, s.right)?;
                if let Some(o) = &s.order_by {
                    write!(f, " {}", o)?;
                }
                if let Some(l) = &s.limit {
                    write!(f, " {}", l)?;
                }
                write_options(f, &s.options)
            }
            Command::Insert(i) => {
                write!(f, "INSERT INTO {} ({})", i.group, display_list(&i.columns))?;
                match &i.source {
                    InsertSource::Values(v) => write!(f, " VALUES ({})", display_list(v))?,
                    InsertSource::Query(q) => write!(f, " {}", q)?,
                }
                write_options(f, &i.options)
            }
            Command::Update(u) => {
                let changes: Vec<String> = u
                    .changes
                    .iter()
                    .map(|c| format!("{} = {}", c.symbol.name, c.value))
                    .collect();
                write!(f, "UPDATE {} SET {}", u.group, changes.join(", "))?;
                if let Some(c) = &u.criteria {
                    write!(f, " WHERE {}", c)?;
                }
                write_options(f, &u.options)
            }
            Command::Delete(d) => {
                write!(f, "DELETE FROM {}", d.group)?;
                if let Some(c) = &d.criteria {
                    write!(f, " WHERE {}", c)?;
                }
                write_options(f, &d.options)
            }
            Command::StoredProcedure(p) => {
                let params: Vec<String> = p
                    .params
                    .iter()
                    .filter_map(|param| {
                        let e = param.expression.as_ref()?;
                        if p.display_named {
                            Some(format!("{} => {}", param.name, e))
                        } else {
                            Some(e.to_string())
                        }
                    })
                    .collect();
                write!(f, "EXEC {}({})", p.name, params.join(", "))?;
                write_options(f, &p.options)
            }
            Command::Dynamic(d) => {
                write!(f, "EXECUTE IMMEDIATE {}", d.sql)?;
                if let Some(into) = &d.into {
                    write!(f, " INTO {}", into)?;
                }
                Ok(())
            }
        }
    }
}
