//! ORDER BY finalization against the projection it sorts.
use crate::engine::objects::{Command, Expression, OrderBy, OrderByItem};

/// Renames later duplicates of a projected name with `_0`, `_1`, ... suffixes. With
/// `name_unnamed` every expression without a name gets its positional one.
pub(super) fn make_names_unique(symbols: &mut [Expression], name_unnamed: bool) {
    let mut taken: Vec<String> = symbols
        .iter()
        .filter_map(|s| s.output_name())
        .map(|n| n.to_ascii_uppercase())
        .collect();
    let mut used: Vec<String> = vec![];

    for (i, symbol) in symbols.iter_mut().enumerate() {
        let name = match symbol.output_name() {
            Some(n) => n.to_string(),
            None if name_unnamed => format!("expr{}", i + 1),
            None => continue,
        };
        let unique = if used.contains(&name.to_ascii_uppercase()) {
            let mut suffix = 0;
            loop {
                let candidate = format!("{}_{}", name, suffix);
                let key = candidate.to_ascii_uppercase();
                if !used.contains(&key) && !taken.contains(&key) {
                    break candidate;
                }
                suffix += 1;
            }
        } else {
            name
        };
        if symbol.output_name() != Some(unique.as_str()) {
            *symbol = Expression::alias(&unique, symbol.clone().into_unaliased());
        }
        used.push(unique.to_ascii_uppercase());
        taken.push(unique.to_ascii_uppercase());
    }
}

/// Names every column of a query shaped command, the left most branch names a set query.
pub(super) fn name_projection(command: &mut Command) {
    match command {
        Command::Query(q) => make_names_unique(&mut q.select.symbols, true),
        Command::SetQuery(s) => name_projection(&mut s.left),
        _ => {}
    }
}

/// The projection a set query's ORDER BY refers to.
pub(super) fn leftmost_symbols(command: &Command) -> Vec<Expression> {
    match command {
        Command::Query(q) => q.select.symbols.clone(),
        Command::SetQuery(s) => leftmost_symbols(&s.left),
        _ => vec![],
    }
}

/// Points each item at its projected column and drops the ones sorting on a constant.
pub(super) fn finalize_order_by(order_by: Option<OrderBy>, symbols: &[Expression]) -> Option<OrderBy> {
    let order_by = order_by?;
    let items: Vec<OrderByItem> = order_by
        .items
        .into_iter()
        .filter(|item| !item.expression.is_constant())
        .map(|mut item| {
            item.position = position_of(&item.expression, symbols);
            item
        })
        .collect();
    if items.is_empty() {
        debug!("Removed an ORDER BY on constants");
        return None;
    }
    Some(OrderBy { items })
}

fn position_of(expression: &Expression, symbols: &[Expression]) -> Option<usize> {
    let structural = symbols
        .iter()
        .position(|s| s == expression || s.unaliased() == expression.unaliased());
    if structural.is_some() {
        return structural;
    }
    // unqualified names and aliases refer to the projection by name
    let name = match expression {
        Expression::Element(e) if e.group.is_none() => e.name.as_str(),
        Expression::Alias(a) => a.name.as_str(),
        _ => return None,
    };
    symbols.iter().position(|s| {
        s.output_name()
            .map(|n| n.eq_ignore_ascii_case(name))
            .unwrap_or(false)
    })
}
