//! Command level rewriting. Every clause is rewritten, then the query is reshaped around
//! its grouping, ordering and target.
use super::order_by::{finalize_order_by, leftmost_symbols, make_names_unique};
use super::{ProcedureContext, Rewriter, RewriterError};
use crate::engine::metadata::Metadata;
use crate::engine::objects::types::DataType;
use crate::engine::objects::{
    Command, Criteria, Delete, DynamicCommand, Expression, FromClause, Insert, InsertSource,
    JoinPredicate, JoinType, Limit, OrderBy, OrderByItem, Query, Select, SetClause, SetQuery,
    SubqueryFromClause, Update,
};

impl<'a> Rewriter<'a> {
    pub(crate) fn rewrite_command(
        &self,
        command: Command,
        ctx: &ProcedureContext,
    ) -> Result<Command, RewriterError> {
        match command {
            Command::Query(q) => Ok(Command::Query(self.rewrite_query(q, ctx)?)),
            Command::SetQuery(s) => self.rewrite_set_query(s, ctx),
            Command::Insert(i) => self.rewrite_insert(i, ctx),
            Command::Update(u) => Ok(Command::Update(self.rewrite_update(u, ctx)?)),
            Command::Delete(d) => Ok(Command::Delete(Delete {
                criteria: self.rewrite_where(d.criteria, ctx)?,
                ..d
            })),
            Command::StoredProcedure(p) => self.rewrite_procedure(p, ctx),
            Command::Dynamic(d) => Ok(Command::Dynamic(DynamicCommand {
                sql: self.rewrite_expression(d.sql, ctx)?,
                into: d.into,
            })),
        }
    }

    fn rewrite_query(&self, query: Query, ctx: &ProcedureContext) -> Result<Query, RewriterError> {
        let from = query
            .from
            .into_iter()
            .map(|f| self.rewrite_from(f, ctx))
            .collect::<Result<Vec<FromClause>, RewriterError>>()?;
        let criteria = self.rewrite_where(query.criteria, ctx)?;
        let group_by = self.rewrite_expressions(query.group_by, ctx)?;
        let symbols = query
            .select
            .symbols
            .into_iter()
            .map(|s| self.rewrite_symbol(s, ctx))
            .collect::<Result<Vec<Expression>, RewriterError>>()?;
        let having = self.rewrite_where(query.having, ctx)?;
        let order_by = match query.order_by {
            Some(o) => Some(self.rewrite_order_by(o, ctx)?),
            None => None,
        };
        let limit = match query.limit {
            Some(l) => self.rewrite_limit(l, ctx)?,
            None => None,
        };

        let mut rewritten = Query {
            select: Select {
                distinct: query.select.distinct,
                symbols,
            },
            from,
            criteria,
            group_by,
            having,
            order_by,
            limit,
            into: query.into,
            options: query.options,
        };

        if !rewritten.group_by.is_empty() {
            rewritten.select.symbols = rewritten
                .select
                .symbols
                .into_iter()
                .map(|s| s.map_expressions(&mut |e| self.demote_aggregate(e)))
                .collect();
            let having = rewritten
                .having
                .map(|h| h.map_expressions(&mut |e| self.demote_aggregate(e)));
            rewritten.having = self.rewrite_where(having, ctx)?;
            rewritten = self.group_by_view(rewritten);
        }

        if rewritten.order_by.is_some() {
            make_names_unique(&mut rewritten.select.symbols, false);
            rewritten.order_by =
                finalize_order_by(rewritten.order_by, &rewritten.select.symbols);
        }

        Ok(self.coerce_into(rewritten))
    }

    /// A symbol keeps the name it projected before the rewrite.
    fn rewrite_symbol(
        &self,
        symbol: Expression,
        ctx: &ProcedureContext,
    ) -> Result<Expression, RewriterError> {
        let name = symbol.output_name().map(|n| n.to_string());
        let rewritten = self.rewrite_expression(symbol, ctx)?;
        Ok(match name {
            Some(n) if rewritten.output_name() != Some(n.as_str()) => {
                Expression::alias(&n, rewritten.into_unaliased())
            }
            _ => rewritten,
        })
    }

    fn rewrite_expressions(
        &self,
        expressions: Vec<Expression>,
        ctx: &ProcedureContext,
    ) -> Result<Vec<Expression>, RewriterError> {
        expressions
            .into_iter()
            .map(|e| self.rewrite_expression(e, ctx))
            .collect()
    }

    fn rewrite_from(
        &self,
        clause: FromClause,
        ctx: &ProcedureContext,
    ) -> Result<FromClause, RewriterError> {
        match clause {
            FromClause::Table(_) => Ok(clause),
            FromClause::Subquery(s) => Ok(FromClause::Subquery(SubqueryFromClause {
                name: s.name,
                command: Box::new(self.rewrite_command(*s.command, ctx)?),
            })),
            FromClause::Join(join) => {
                let left = self.rewrite_from(*join.left, ctx)?;
                let right = self.rewrite_from(*join.right, ctx)?;
                let (left, join_type, right, criteria) = match join.join_type {
                    JoinType::RightOuter => {
                        debug!("Rewriting RIGHT OUTER JOIN {} as a LEFT OUTER JOIN", right);
                        (right, JoinType::LeftOuter, left, join.criteria)
                    }
                    JoinType::Union => {
                        debug!("Rewriting UNION JOIN as a FULL OUTER JOIN that never matches");
                        (left, JoinType::FullOuter, right, vec![Criteria::False])
                    }
                    t => (left, t, right, join.criteria),
                };
                Ok(FromClause::Join(JoinPredicate {
                    left: Box::new(left),
                    join_type,
                    right: Box::new(right),
                    criteria: self.rewrite_join_criteria(criteria, ctx)?,
                }))
            }
        }
    }

    fn rewrite_join_criteria(
        &self,
        mut criteria: Vec<Criteria>,
        ctx: &ProcedureContext,
    ) -> Result<Vec<Criteria>, RewriterError> {
        let combined = match criteria.len() {
            0 => return Ok(criteria),
            1 => criteria.remove(0),
            _ => Criteria::and(criteria),
        };
        Ok(match self.rewrite_criteria(combined, ctx, false)? {
            Criteria::True => vec![],
            Criteria::False | Criteria::Unknown => vec![Criteria::False],
            c => c.conjuncts().into_iter().cloned().collect(),
        })
    }

    fn rewrite_order_by(
        &self,
        order_by: OrderBy,
        ctx: &ProcedureContext,
    ) -> Result<OrderBy, RewriterError> {
        let items = order_by
            .items
            .into_iter()
            .map(|item| {
                Ok(OrderByItem {
                    expression: self.rewrite_expression(item.expression, ctx)?,
                    ..item
                })
            })
            .collect::<Result<Vec<OrderByItem>, RewriterError>>()?;
        Ok(OrderBy { items })
    }

    /// A zero offset is no offset, a limit with neither part is no limit.
    fn rewrite_limit(
        &self,
        limit: Limit,
        ctx: &ProcedureContext,
    ) -> Result<Option<Limit>, RewriterError> {
        let offset = match limit.offset {
            Some(o) => Some(self.rewrite_expression(o, ctx)?),
            None => None,
        };
        let offset = offset.filter(|o| match o {
            Expression::Constant(c) => c.value.as_i64() != Some(0),
            _ => true,
        });
        let row_limit = match limit.row_limit {
            Some(r) => Some(self.rewrite_expression(r, ctx)?),
            None => None,
        };
        if offset.is_none() && row_limit.is_none() {
            return Ok(None);
        }
        Ok(Some(Limit { offset, row_limit }))
    }

    fn rewrite_set_query(
        &self,
        set: SetQuery,
        ctx: &ProcedureContext,
    ) -> Result<Command, RewriterError> {
        let mut left = self.rewrite_branch(*set.left, ctx)?;
        let mut right = self.rewrite_branch(*set.right, ctx)?;
        if let Some(types) = &set.projected_types {
            left = self.correct_types(left, types);
            right = self.correct_types(right, types);
        }

        let order_by = match set.order_by {
            Some(o) => {
                let order_by = self.rewrite_order_by(o, ctx)?;
                unique_leftmost_names(&mut left);
                finalize_order_by(Some(order_by), &leftmost_symbols(&left))
            }
            None => None,
        };
        let limit = match set.limit {
            Some(l) => self.rewrite_limit(l, ctx)?,
            None => None,
        };
        Ok(Command::SetQuery(SetQuery {
            left: Box::new(left),
            right: Box::new(right),
            order_by,
            limit,
            ..set
        }))
    }

    /// Branch order only matters when the branch is limited.
    fn rewrite_branch(
        &self,
        command: Command,
        ctx: &ProcedureContext,
    ) -> Result<Command, RewriterError> {
        let command = match command {
            Command::Query(mut q) if q.limit.is_none() && q.order_by.is_some() => {
                debug!("Dropping the ORDER BY of set query branch {}", q);
                q.order_by = None;
                Command::Query(q)
            }
            Command::SetQuery(mut s) if s.limit.is_none() && s.order_by.is_some() => {
                debug!("Dropping the ORDER BY of a nested set query");
                s.order_by = None;
                Command::SetQuery(s)
            }
            c => c,
        };
        self.rewrite_command(command, ctx)
    }

    /// Converts each branch's projection to the common types of the set query.
    fn correct_types(&self, command: Command, types: &[DataType]) -> Command {
        match command {
            Command::Query(mut q) if q.select.symbols.len() == types.len() => {
                q.select.symbols = q
                    .select
                    .symbols
                    .into_iter()
                    .zip(types)
                    .map(|(symbol, data_type)| {
                        if symbol.data_type() == *data_type {
                            return symbol;
                        }
                        let name = symbol.output_name().map(|n| n.to_string());
                        let converted = self.retype(symbol.into_unaliased(), *data_type);
                        match name {
                            Some(n) => Expression::alias(&n, converted),
                            None => converted,
                        }
                    })
                    .collect();
                Command::Query(q)
            }
            Command::SetQuery(mut s) => {
                s.left = Box::new(self.correct_types(*s.left, types));
                s.right = Box::new(self.correct_types(*s.right, types));
                s.projected_types = Some(types.to_vec());
                Command::SetQuery(s)
            }
            c => c,
        }
    }

    fn rewrite_insert(
        &self,
        insert: Insert,
        ctx: &ProcedureContext,
    ) -> Result<Command, RewriterError> {
        match insert.source {
            InsertSource::Values(values) => {
                let values = values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let value = self.rewrite_expression(value, ctx)?;
                        Ok(match insert.columns.get(i) {
                            Some(column) => self.retype(value, column.data_type),
                            None => value,
                        })
                    })
                    .collect::<Result<Vec<Expression>, RewriterError>>()?;
                Ok(Command::Insert(Insert {
                    source: InsertSource::Values(values),
                    ..insert
                }))
            }
            InsertSource::Query(source) => {
                let source = self.rewrite_command(*source, ctx)?;
                if !matches!(source, Command::SetQuery(_)) {
                    return Ok(Command::Insert(Insert {
                        source: InsertSource::Query(Box::new(source)),
                        ..insert
                    }));
                }

                let (from, view_columns) = self.view_of(source);
                let symbols = view_columns
                    .into_iter()
                    .zip(&insert.columns)
                    .map(|(view_column, column)| {
                        let value = self.retype(view_column, column.data_type);
                        if value.output_name() == Some(column.name.as_str()) {
                            value
                        } else {
                            Expression::alias(&column.name, value)
                        }
                    })
                    .collect();
                let query = Query {
                    select: Select::new(symbols),
                    from: vec![from],
                    ..Default::default()
                };

                let target_columns = self.metadata.group_elements(insert.group.metadata_name());
                let covers_target = target_columns.len() == insert.columns.len()
                    && target_columns
                        .iter()
                        .zip(&insert.columns)
                        .all(|(t, c)| t.name.eq_ignore_ascii_case(&c.name));
                if covers_target {
                    debug!("Rewriting INSERT INTO {} from a set query as SELECT INTO", insert.group);
                    return Ok(Command::Query(Query {
                        into: Some(insert.group),
                        options: insert.options,
                        ..query
                    }));
                }
                Ok(Command::Insert(Insert {
                    source: InsertSource::Query(Box::new(Command::Query(query))),
                    ..insert
                }))
            }
        }
    }

    fn rewrite_update(&self, update: Update, ctx: &ProcedureContext) -> Result<Update, RewriterError> {
        let changes = update
            .changes
            .into_iter()
            .map(|change| {
                let value = self.rewrite_expression(change.value, ctx)?;
                Ok(SetClause {
                    value: self.retype(value, change.symbol.data_type),
                    symbol: change.symbol,
                })
            })
            .collect::<Result<Vec<SetClause>, RewriterError>>()?;
        Ok(Update {
            changes,
            criteria: self.rewrite_where(update.criteria, ctx)?,
            ..update
        })
    }
}

fn unique_leftmost_names(command: &mut Command) {
    match command {
        Command::Query(q) => make_names_unique(&mut q.select.symbols, false),
        Command::SetQuery(s) => unique_leftmost_names(&mut s.left),
        _ => {}
    }
}
