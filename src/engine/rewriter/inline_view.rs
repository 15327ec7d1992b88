//! Synthesized inline views. A query grouping on expressions is split so the outer query
//! groups on plain columns of a view that computes them.
use super::order_by::{make_names_unique, name_projection};
use super::Rewriter;
use crate::constants::Nullable;
use crate::engine::metadata::Metadata;
use crate::engine::objects::types::DataType;
use crate::engine::objects::{
    Attribute, Command, ElementSymbol, Expression, FromClause, OrderBy, OrderByItem, Query,
    Select, SubqueryFromClause, Table,
};

impl<'a> Rewriter<'a> {
    /// Moves the grouping expressions of `query` into an inline view, a query grouping
    /// only on columns comes back unchanged.
    pub(super) fn group_by_view(&self, query: Query) -> Query {
        if query
            .group_by
            .iter()
            .all(|g| matches!(g, Expression::Element(_)))
        {
            return query;
        }
        if has_subqueries(&query) {
            debug!("Not creating an inline view for {}, it has subqueries", query);
            return query;
        }
        let view = self.view_name();

        let mut elements: Vec<ElementSymbol> = vec![];
        for symbol in &query.select.symbols {
            symbol.collect_elements(&mut elements);
        }
        if let Some(having) = &query.having {
            for e in having.elements() {
                push_unique(&mut elements, e);
            }
        }
        if let Some(order_by) = &query.order_by {
            for item in &order_by.items {
                item.expression.collect_elements(&mut elements);
            }
        }
        for g in &query.group_by {
            if let Expression::Element(e) = g {
                push_unique(&mut elements, e.clone());
            }
        }
        // unqualified names refer to the projection, not to a column of the view
        elements.retain(|e| e.group.is_some());

        let mut inner_symbols: Vec<Expression> = vec![];
        let mut used: Vec<String> = vec![];
        let mut mapping: Vec<(Expression, Expression)> = vec![];
        let mut counter = 0;

        for element in elements {
            let name = if used.contains(&element.name.to_ascii_uppercase()) {
                next_expr_name(&mut counter, &used)
            } else {
                element.name.clone()
            };
            let outer = Expression::element(Some(&view), &name, element.data_type);
            let inner = Expression::Element(element);
            inner_symbols.push(if inner.output_name() == Some(name.as_str()) {
                inner.clone()
            } else {
                Expression::alias(&name, inner.clone())
            });
            used.push(name.to_ascii_uppercase());
            mapping.push((inner, outer));
        }
        for g in &query.group_by {
            if matches!(g, Expression::Element(_)) || mapping.iter().any(|(inner, _)| inner == g) {
                continue;
            }
            let name = next_expr_name(&mut counter, &used);
            inner_symbols.push(Expression::alias(&name, g.clone()));
            used.push(name.to_ascii_uppercase());
            mapping.push((
                g.clone(),
                Expression::element(Some(&view), &name, g.data_type()),
            ));
        }

        let to_view = |expression: Expression| -> Expression {
            expression.map_expressions(&mut |e| {
                mapping
                    .iter()
                    .find(|(inner, _)| inner == e)
                    .map(|(_, outer)| outer.clone())
            })
        };

        let symbols = query
            .select
            .symbols
            .into_iter()
            .enumerate()
            .map(|(i, symbol)| {
                let name = symbol.output_name().map(|n| n.to_string());
                let mapped = to_view(symbol);
                match (name, mapped.output_name()) {
                    (Some(n), Some(m)) if n == m => mapped,
                    (Some(n), _) => Expression::alias(&n, mapped.into_unaliased()),
                    (None, Some(_)) => Expression::alias(&format!("expr{}", i + 1), mapped),
                    (None, None) => mapped,
                }
            })
            .collect();
        let group_by = query.group_by.into_iter().map(&to_view).collect();
        let having = query.having.map(|h| {
            h.map_expressions(&mut |e| {
                mapping
                    .iter()
                    .find(|(inner, _)| inner == e)
                    .map(|(_, outer)| outer.clone())
            })
        });
        let order_by = query.order_by.map(|o| OrderBy {
            items: o
                .items
                .into_iter()
                .map(|item| OrderByItem {
                    expression: to_view(item.expression),
                    ..item
                })
                .collect(),
        });

        let inner = Query {
            select: Select::new(inner_symbols),
            from: query.from,
            criteria: query.criteria,
            ..Default::default()
        };
        self.register_view(&view, &Command::Query(inner.clone()));
        debug!("Created inline view {} as {}", view, inner);

        Query {
            select: Select {
                distinct: query.select.distinct,
                symbols,
            },
            from: vec![FromClause::Subquery(SubqueryFromClause {
                name: view,
                command: Box::new(Command::Query(inner)),
            })],
            criteria: None,
            group_by,
            having,
            order_by,
            limit: query.limit,
            into: query.into,
            options: query.options,
        }
    }

    /// Wraps `command` as an inline view, returning the clause and the view's columns.
    pub(super) fn view_of(&self, mut command: Command) -> (FromClause, Vec<Expression>) {
        name_projection(&mut command);
        let view = self.view_name();
        let columns = self.register_view(&view, &command);
        (
            FromClause::Subquery(SubqueryFromClause {
                name: view,
                command: Box::new(command),
            }),
            columns,
        )
    }

    /// SELECT ... INTO a group whose column types differ from the projection converts
    /// through an inline view.
    pub(super) fn coerce_into(&self, mut query: Query) -> Query {
        let target = match &query.into {
            Some(t) => t.clone(),
            None => return query,
        };
        let columns = self.metadata.group_elements(target.metadata_name());
        let types = query.select.projected_types();
        if columns.len() != types.len()
            || columns.iter().zip(&types).all(|(c, t)| c.data_type == *t)
        {
            return query;
        }

        query.into = None;
        let options = std::mem::take(&mut query.options);
        make_names_unique(&mut query.select.symbols, true);
        let (from, view_columns) = self.view_of(Command::Query(query));
        let symbols = view_columns
            .into_iter()
            .zip(columns)
            .map(|(view_column, target_column)| {
                let converted = self.retype(view_column, target_column.data_type);
                if converted.output_name() == Some(target_column.name.as_str()) {
                    converted
                } else {
                    Expression::alias(&target_column.name, converted)
                }
            })
            .collect();
        debug!("Converting the projection of SELECT INTO {}", target);
        Query {
            select: Select::new(symbols),
            from: vec![from],
            into: Some(target),
            options,
            ..Default::default()
        }
    }

    /// The configured view name, numbered past any group already known, so nested views
    /// keep their own metadata.
    fn view_name(&self) -> String {
        let base = &self.config.inline_view_name;
        if self.metadata.group(base).is_none() {
            return base.clone();
        }
        let prefix = base.trim_end_matches(|c: char| c.is_ascii_digit());
        let mut n: u64 = base[prefix.len()..].parse().unwrap_or(1);
        loop {
            n += 1;
            let name = format!("{}{}", prefix, n);
            if self.metadata.group(&name).is_none() {
                return name;
            }
        }
    }

    fn register_view(&self, view: &str, command: &Command) -> Vec<Expression> {
        let names = command.projected_names();
        let types = command.projected_types();
        let attributes = names
            .iter()
            .zip(&types)
            .map(|(n, t)| Attribute::new(n, *t, Nullable::Unknown))
            .collect();
        self.metadata.add_temp_group(Table::new(view, attributes));
        names
            .iter()
            .zip(types)
            .map(|(n, t): (&String, DataType)| Expression::element(Some(view), n, t))
            .collect()
    }
}

fn push_unique(elements: &mut Vec<ElementSymbol>, element: ElementSymbol) {
    if !elements.contains(&element) {
        elements.push(element);
    }
}

fn next_expr_name(counter: &mut usize, used: &[String]) -> String {
    loop {
        let name = format!("EXPR{}", counter);
        *counter += 1;
        if !used.contains(&name) {
            return name;
        }
    }
}

fn has_subqueries(query: &Query) -> bool {
    query.select.symbols.iter().any(|s| s.has_subquery())
        || query.group_by.iter().any(|g| g.has_subquery())
        || query.criteria.as_ref().map(|c| c.has_subquery()).unwrap_or(false)
        || query.having.as_ref().map(|h| h.has_subquery()).unwrap_or(false)
        || query
            .order_by
            .as_ref()
            .map(|o| o.items.iter().any(|i| i.expression.has_subquery()))
            .unwrap_or(false)
}
