//! Predicate rewriting under three valued logic.
//!
//! `preserve_unknown` is false where only TRUE lets a row through (WHERE, HAVING, ON,
//! CASE WHEN, IF and WHILE conditions). There UNKNOWN and FALSE are interchangeable.
//! Under a NOT they are not, so the distinction is kept.
use super::evaluatable::{is_fully_evaluable, is_fully_evaluable_criteria};
use super::expression::string_constant;
use super::{ProcedureContext, Rewriter, RewriterError};
use crate::engine::objects::types::Value;
use crate::engine::objects::{
    BetweenCriteria, CompareCriteria, CompareOperator, CompoundCriteria, CompoundOperator,
    Criteria, ExistsCriteria, Expression, IsNullCriteria, MatchCriteria, Quantifier, SetCriteria,
    SubqueryCompareCriteria, SubquerySetCriteria,
};

impl<'a> Rewriter<'a> {
    pub(crate) fn rewrite_criteria(
        &self,
        criteria: Criteria,
        ctx: &ProcedureContext,
        preserve_unknown: bool,
    ) -> Result<Criteria, RewriterError> {
        let rewritten = match criteria {
            Criteria::True | Criteria::False | Criteria::Unknown => return Ok(criteria),
            Criteria::Compound(c) => self.rewrite_compound(c, ctx, preserve_unknown)?,
            Criteria::Not(c) => self.rewrite_not(*c, ctx, preserve_unknown)?,
            Criteria::Compare(c) => self.rewrite_compare(c, ctx, preserve_unknown)?,
            Criteria::Like(m) => self.rewrite_like(m, ctx, preserve_unknown)?,
            Criteria::Between(b) => return self.rewrite_between(b, ctx, preserve_unknown),
            Criteria::In(s) => self.rewrite_set(s, ctx, preserve_unknown)?,
            Criteria::IsNull(i) => Criteria::IsNull(IsNullCriteria {
                expression: self.rewrite_expression(i.expression, ctx)?,
                negated: i.negated,
            }),
            Criteria::Exists(e) => Criteria::Exists(ExistsCriteria {
                command: Box::new(self.rewrite_command(*e.command, ctx)?),
                negated: e.negated,
            }),
            Criteria::SubqueryCompare(s) => {
                let quantifier = match s.quantifier {
                    Quantifier::Any => Quantifier::Some,
                    q => q,
                };
                Criteria::SubqueryCompare(SubqueryCompareCriteria {
                    left: self.rewrite_expression(s.left, ctx)?,
                    operator: s.operator,
                    quantifier,
                    command: Box::new(self.rewrite_command(*s.command, ctx)?),
                })
            }
            Criteria::SubqueryIn(s) => {
                let expression = self.rewrite_expression(s.expression, ctx)?;
                if expression.is_null_constant() && !s.negated && !preserve_unknown {
                    return Ok(Criteria::Unknown);
                }
                Criteria::SubqueryIn(SubquerySetCriteria {
                    expression,
                    command: Box::new(self.rewrite_command(*s.command, ctx)?),
                    negated: s.negated,
                })
            }
            Criteria::Has(selector) => self.rewrite_has(&selector, ctx),
            Criteria::Translate(t) => self.rewrite_translate(t, ctx, preserve_unknown)?,
            Criteria::Expression(e) => Criteria::Expression(self.rewrite_expression(e, ctx)?),
        };
        self.evaluate_criteria(rewritten)
    }

    /// Replaces a predicate with its outcome when nothing in it depends on a row.
    fn evaluate_criteria(&self, criteria: Criteria) -> Result<Criteria, RewriterError> {
        if criteria.is_sentinel() || !is_fully_evaluable_criteria(&criteria) {
            return Ok(criteria);
        }
        match self.evaluator.evaluate_criteria(&criteria) {
            Ok(outcome) => {
                let result = Criteria::from_bool(outcome);
                trace!("Evaluated {} to {}", criteria, result);
                Ok(result)
            }
            Err(e) => Err(RewriterError::CriteriaEvaluation(criteria.to_string(), e)),
        }
    }

    /// A WHERE or HAVING clause, None when it filters nothing.
    pub(crate) fn rewrite_where(
        &self,
        criteria: Option<Criteria>,
        ctx: &ProcedureContext,
    ) -> Result<Option<Criteria>, RewriterError> {
        let criteria = match criteria {
            Some(c) => c,
            None => return Ok(None),
        };
        match self.rewrite_criteria(criteria, ctx, false)? {
            Criteria::True => Ok(None),
            Criteria::Unknown => Ok(Some(Criteria::False)),
            c => Ok(Some(c)),
        }
    }

    fn rewrite_compound(
        &self,
        compound: CompoundCriteria,
        ctx: &ProcedureContext,
        preserve_unknown: bool,
    ) -> Result<Criteria, RewriterError> {
        let operator = compound.operator;
        let mut children: Vec<Criteria> = vec![];
        let mut unknown = false;

        for child in compound.criteria {
            let flattened = match self.rewrite_criteria(child, ctx, preserve_unknown)? {
                Criteria::Compound(c) if c.operator == operator => c.criteria,
                c => vec![c],
            };
            for child in flattened {
                match (operator, child) {
                    (CompoundOperator::And, Criteria::False) => return Ok(Criteria::False),
                    (CompoundOperator::Or, Criteria::True) => return Ok(Criteria::True),
                    (CompoundOperator::And, Criteria::True) | (CompoundOperator::Or, Criteria::False) => {}
                    (CompoundOperator::And, Criteria::Unknown) => {
                        if !preserve_unknown {
                            return Ok(Criteria::False);
                        }
                        unknown = true;
                    }
                    (CompoundOperator::Or, Criteria::Unknown) => unknown |= preserve_unknown,
                    (_, c) => {
                        if !children.contains(&c) {
                            children.push(c);
                        }
                    }
                }
            }
        }

        if unknown {
            children.push(Criteria::Unknown);
        }
        match children.len() {
            0 => Ok(match operator {
                CompoundOperator::And => Criteria::True,
                CompoundOperator::Or => Criteria::False,
            }),
            1 => Ok(children.remove(0)),
            _ => Ok(Criteria::Compound(CompoundCriteria {
                operator,
                criteria: children,
            })),
        }
    }

    fn rewrite_not(
        &self,
        inner: Criteria,
        ctx: &ProcedureContext,
        preserve_unknown: bool,
    ) -> Result<Criteria, RewriterError> {
        let pushed = match self.rewrite_criteria(inner, ctx, true)? {
            Criteria::True => return Ok(Criteria::False),
            Criteria::False => return Ok(Criteria::True),
            Criteria::Unknown => return Ok(Criteria::Unknown),
            Criteria::Not(c) => *c,
            Criteria::Compare(mut c) => {
                c.operator = c.operator.negate();
                Criteria::Compare(c)
            }
            Criteria::IsNull(mut i) => {
                i.negated = !i.negated;
                Criteria::IsNull(i)
            }
            Criteria::In(mut s) => {
                s.negated = !s.negated;
                Criteria::In(s)
            }
            Criteria::Like(mut m) => {
                m.negated = !m.negated;
                Criteria::Like(m)
            }
            Criteria::Exists(mut e) => {
                e.negated = !e.negated;
                return Ok(Criteria::Exists(e));
            }
            Criteria::SubqueryIn(mut s) => {
                s.negated = !s.negated;
                return Ok(Criteria::SubqueryIn(s));
            }
            c => return Ok(Criteria::not(c)),
        };
        // the pushed down form may simplify further outside of the NOT
        self.rewrite_criteria(pushed, ctx, preserve_unknown)
    }

    fn rewrite_compare(
        &self,
        compare: CompareCriteria,
        ctx: &ProcedureContext,
        preserve_unknown: bool,
    ) -> Result<Criteria, RewriterError> {
        let left = self.rewrite_expression(compare.left, ctx)?;
        let right = self.rewrite_expression(compare.right, ctx)?;
        if left.is_null_constant() || right.is_null_constant() {
            return Ok(Criteria::Unknown);
        }

        // constants go on the right
        let compare = if is_fully_evaluable(&left) && !is_fully_evaluable(&right) {
            CompareCriteria {
                left: right,
                operator: compare.operator.flip(),
                right: left,
            }
        } else {
            CompareCriteria {
                left,
                operator: compare.operator,
                right,
            }
        };

        if self.config.invert_compare_functions && compare.right.is_constant() {
            return self.invert_compare(compare, ctx, preserve_unknown);
        }
        Ok(Criteria::Compare(compare))
    }

    fn rewrite_like(
        &self,
        like: MatchCriteria,
        ctx: &ProcedureContext,
        preserve_unknown: bool,
    ) -> Result<Criteria, RewriterError> {
        let left = self.rewrite_expression(like.left, ctx)?;
        let right = self.rewrite_expression(like.right, ctx)?;
        if left.is_null_constant() || right.is_null_constant() {
            return Ok(Criteria::Unknown);
        }
        let negated = like.negated;
        let pattern = match string_constant(&right) {
            Some(p) => p.to_string(),
            None => {
                return Ok(Criteria::Like(MatchCriteria {
                    left,
                    right,
                    escape: like.escape,
                    negated,
                }))
            }
        };
        let escape = like.escape.filter(|e| pattern.contains(*e));

        if escape.is_none() && !pattern.is_empty() && pattern.chars().all(|c| c == '%') {
            let nullable = self.may_be_null(&left);
            if preserve_unknown && nullable {
                // a null value makes this UNKNOWN which neither TRUE nor IS NOT NULL reproduce
                return Ok(Criteria::Like(MatchCriteria {
                    left,
                    right,
                    escape,
                    negated,
                }));
            }
            return Ok(match (negated, nullable) {
                (true, _) => Criteria::False,
                (false, false) => Criteria::True,
                (false, true) => Criteria::is_null(left, true),
            });
        }

        if let Some(literal) = unescape_literal(&pattern, escape) {
            let operator = if negated {
                CompareOperator::Ne
            } else {
                CompareOperator::Eq
            };
            let literal = Expression::typed_constant(Value::String(literal), right.data_type());
            return self.rewrite_criteria(
                Criteria::compare(left, operator, literal),
                ctx,
                preserve_unknown,
            );
        }

        Ok(Criteria::Like(MatchCriteria {
            left,
            right,
            escape,
            negated,
        }))
    }

    fn rewrite_between(
        &self,
        between: BetweenCriteria,
        ctx: &ProcedureContext,
        preserve_unknown: bool,
    ) -> Result<Criteria, RewriterError> {
        let BetweenCriteria {
            expression,
            lower,
            upper,
            negated,
        } = between;
        let expanded = if negated {
            Criteria::or(vec![
                Criteria::compare(expression.clone(), CompareOperator::Lt, lower),
                Criteria::compare(expression, CompareOperator::Gt, upper),
            ])
        } else {
            Criteria::and(vec![
                Criteria::compare(expression.clone(), CompareOperator::Ge, lower),
                Criteria::compare(expression, CompareOperator::Le, upper),
            ])
        };
        self.rewrite_criteria(expanded, ctx, preserve_unknown)
    }

    fn rewrite_set(
        &self,
        set: SetCriteria,
        ctx: &ProcedureContext,
        preserve_unknown: bool,
    ) -> Result<Criteria, RewriterError> {
        let expression = self.rewrite_expression(set.expression, ctx)?;
        if expression.is_null_constant() {
            return Ok(Criteria::Unknown);
        }
        let negated = set.negated;

        let mut values: Vec<Expression> = vec![];
        let mut has_null = false;
        for value in set.values {
            let value = self.rewrite_expression(value, ctx)?;
            if value.is_null_constant() {
                has_null = true;
                if !preserve_unknown {
                    continue;
                }
            }
            if !values.contains(&value) {
                values.push(value);
            }
        }
        if negated && has_null && !preserve_unknown {
            // NOT IN with a null candidate is never TRUE
            return Ok(Criteria::False);
        }

        if !negated && self.config.invert_compare_functions && values.iter().all(Expression::is_constant) {
            if let Some((inner, inverted)) = self.invert_set_conversion(&expression, &values)? {
                debug!("Moved {} off the IN probe", expression);
                return self.rewrite_criteria(
                    Criteria::In(SetCriteria {
                        expression: inner,
                        values: inverted,
                        negated,
                    }),
                    ctx,
                    preserve_unknown,
                );
            }
        }

        match values.len() {
            0 => Ok(Criteria::from_bool(Some(negated))),
            1 => {
                let operator = if negated {
                    CompareOperator::Ne
                } else {
                    CompareOperator::Eq
                };
                let value = values.remove(0);
                self.rewrite_criteria(
                    Criteria::compare(expression, operator, value),
                    ctx,
                    preserve_unknown,
                )
            }
            _ => Ok(Criteria::In(SetCriteria {
                expression,
                values,
                negated,
            })),
        }
    }
}

/// The literal a LIKE pattern matches, None if it has wildcards or a dangling escape.
fn unescape_literal(pattern: &str, escape: Option<char>) -> Option<String> {
    let mut literal = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if Some(c) == escape {
            literal.push(chars.next()?);
        } else if c == '%' || c == '_' {
            return None;
        } else {
            literal.push(c);
        }
    }
    Some(literal)
}

#[cfg(test)]
mod tests {
    use super::super::super::evaluator::ConstantEvaluator;
    use super::super::super::metadata::{BasicMetadata, Metadata};
    use super::*;
    use crate::config::RewriterConfig;
    use crate::constants::Nullable;
    use crate::engine::objects::types::DataType;
    use crate::engine::objects::{Attribute, Command, FromClause, GroupSymbol, Query, Select, Table};

    fn metadata() -> BasicMetadata {
        BasicMetadata::new().with_group(Table::new(
            "t",
            vec![
                Attribute::new("a", DataType::Integer, Nullable::Null),
                Attribute::new("b", DataType::Integer, Nullable::NotNull),
                Attribute::new("s", DataType::String, Nullable::Null),
                Attribute::new("n", DataType::String, Nullable::NotNull),
            ],
        ))
    }

    fn a() -> Expression {
        Expression::element(Some("t"), "a", DataType::Integer)
    }

    fn int(i: i32) -> Expression {
        Expression::constant(Value::Integer(i))
    }

    fn string(s: &str) -> Expression {
        Expression::constant(Value::String(s.to_string()))
    }

    fn rewrite_with(
        metadata: &dyn Metadata,
        criteria: Criteria,
        preserve: bool,
    ) -> Result<Criteria, RewriterError> {
        let evaluator = ConstantEvaluator::new();
        let config = RewriterConfig::default();
        let rewriter = Rewriter::new(metadata, &evaluator, &config);
        rewriter.rewrite_criteria(criteria, &ProcedureContext::new(), preserve)
    }

    fn rewrite(criteria: Criteria) -> Result<Criteria, RewriterError> {
        rewrite_with(&metadata(), criteria, false)
    }

    fn like(column: &str, pattern: &str, negated: bool) -> Criteria {
        Criteria::Like(MatchCriteria {
            left: Expression::element(Some("t"), column, DataType::String),
            right: string(pattern),
            escape: None,
            negated,
        })
    }

    fn subquery(criteria: Option<Criteria>) -> Box<Command> {
        Box::new(Command::Query(Query {
            select: Select::new(vec![a()]),
            from: vec![FromClause::Table(GroupSymbol::new("t"))],
            criteria,
            ..Default::default()
        }))
    }

    fn filter(command: &Command) -> Option<&Criteria> {
        match command {
            Command::Query(q) => q.criteria.as_ref(),
            _ => None,
        }
    }

    fn one_is_one() -> Criteria {
        Criteria::compare(int(1), CompareOperator::Eq, int(1))
    }

    #[test]
    fn test_subqueries_are_rewritten() -> Result<(), Box<dyn std::error::Error>> {
        match rewrite(Criteria::Exists(ExistsCriteria {
            command: subquery(Some(one_is_one())),
            negated: false,
        }))? {
            Criteria::Exists(e) => assert_eq!(filter(&e.command), None),
            c => panic!("Expected EXISTS, got {}", c),
        }

        match rewrite(Criteria::SubqueryCompare(SubqueryCompareCriteria {
            left: a(),
            operator: CompareOperator::Gt,
            quantifier: Quantifier::Any,
            command: subquery(Some(one_is_one())),
        }))? {
            Criteria::SubqueryCompare(s) => {
                assert_eq!(s.quantifier, Quantifier::Some);
                assert_eq!(filter(&s.command), None);
            }
            c => panic!("Expected a subquery compare, got {}", c),
        }

        match rewrite(Criteria::SubqueryCompare(SubqueryCompareCriteria {
            left: a(),
            operator: CompareOperator::Eq,
            quantifier: Quantifier::All,
            command: subquery(None),
        }))? {
            Criteria::SubqueryCompare(s) => assert_eq!(s.quantifier, Quantifier::All),
            c => panic!("Expected a subquery compare, got {}", c),
        }
        Ok(())
    }

    #[test]
    fn test_null_subquery_in_skips_the_subquery() -> Result<(), Box<dyn std::error::Error>> {
        let failing = Criteria::compare(
            Expression::function("/", vec![int(1), int(0)], DataType::Integer),
            CompareOperator::Eq,
            int(1),
        );
        let null_in = |negated| {
            Criteria::SubqueryIn(SubquerySetCriteria {
                expression: Expression::null(DataType::Integer),
                command: subquery(Some(failing.clone())),
                negated,
            })
        };
        assert_eq!(rewrite(null_in(false))?, Criteria::Unknown);
        // NULL NOT IN an empty result is true, so the subquery still matters
        assert!(rewrite(null_in(true)).is_err());

        match rewrite(Criteria::SubqueryIn(SubquerySetCriteria {
            expression: a(),
            command: subquery(Some(one_is_one())),
            negated: false,
        }))? {
            Criteria::SubqueryIn(s) => assert_eq!(filter(&s.command), None),
            c => panic!("Expected a subquery IN, got {}", c),
        }
        Ok(())
    }

    #[test]
    fn test_compound_identities() -> Result<(), Box<dyn std::error::Error>> {
        let b = Criteria::compare(a(), CompareOperator::Gt, int(1));
        assert_eq!(rewrite(Criteria::and(vec![Criteria::True, b.clone()]))?, b);
        assert_eq!(rewrite(Criteria::and(vec![Criteria::False, b.clone()]))?, Criteria::False);
        assert_eq!(rewrite(Criteria::or(vec![Criteria::True, b.clone()]))?, Criteria::True);
        assert_eq!(rewrite(Criteria::or(vec![Criteria::False, b.clone()]))?, b);
        assert_eq!(rewrite(Criteria::not(Criteria::True))?, Criteria::False);
        assert_eq!(rewrite(Criteria::not(Criteria::Unknown))?, Criteria::Unknown);
        Ok(())
    }

    #[test]
    fn test_unknown_handling() -> Result<(), Box<dyn std::error::Error>> {
        let b = Criteria::compare(a(), CompareOperator::Gt, int(1));
        let with_unknown = Criteria::or(vec![Criteria::Unknown, b.clone()]);
        assert_eq!(rewrite(with_unknown.clone())?, b);
        assert_eq!(
            rewrite_with(&metadata(), with_unknown, true)?,
            Criteria::or(vec![b.clone(), Criteria::Unknown])
        );
        assert_eq!(
            rewrite(Criteria::and(vec![Criteria::Unknown, b.clone()]))?,
            Criteria::False
        );
        Ok(())
    }

    #[test]
    fn test_flatten() -> Result<(), Box<dyn std::error::Error>> {
        let x = Criteria::compare(a(), CompareOperator::Gt, int(1));
        let y = Criteria::compare(a(), CompareOperator::Lt, int(9));
        let z = Criteria::is_null(a(), true);
        let nested = Criteria::and(vec![x.clone(), Criteria::and(vec![y.clone(), z.clone(), x.clone()])]);
        assert_eq!(rewrite(nested)?, Criteria::and(vec![x, y, z]));
        Ok(())
    }

    #[test]
    fn test_not_pushdown() -> Result<(), Box<dyn std::error::Error>> {
        let not = Criteria::not(Criteria::compare(a(), CompareOperator::Lt, int(3)));
        assert_eq!(rewrite(not)?.to_string(), "t.a >= 3");

        let not_null = Criteria::not(Criteria::is_null(a(), false));
        assert_eq!(rewrite(not_null)?.to_string(), "t.a IS NOT NULL");

        let double = Criteria::not(Criteria::not(Criteria::or(vec![
            Criteria::compare(a(), CompareOperator::Eq, int(1)),
            Criteria::Expression(Expression::element(Some("t"), "flag", DataType::Boolean)),
        ])));
        assert_eq!(rewrite(double)?.to_string(), "t.a = 1 OR t.flag");
        Ok(())
    }

    #[test]
    fn test_compare() -> Result<(), Box<dyn std::error::Error>> {
        let swapped = Criteria::compare(int(1), CompareOperator::Lt, a());
        assert_eq!(rewrite(swapped)?.to_string(), "t.a > 1");
        let null = Criteria::compare(a(), CompareOperator::Eq, Expression::null(DataType::Integer));
        assert_eq!(rewrite(null)?, Criteria::Unknown);
        let constant = Criteria::compare(int(1), CompareOperator::Lt, int(2));
        assert_eq!(rewrite(constant)?, Criteria::True);
        Ok(())
    }

    #[test]
    fn test_between() -> Result<(), Box<dyn std::error::Error>> {
        let between = Criteria::Between(BetweenCriteria {
            expression: a(),
            lower: int(1),
            upper: int(5),
            negated: false,
        });
        assert_eq!(rewrite(between)?.to_string(), "t.a >= 1 AND t.a <= 5");
        let not_between = Criteria::Between(BetweenCriteria {
            expression: a(),
            lower: int(1),
            upper: int(5),
            negated: true,
        });
        assert_eq!(rewrite(not_between)?.to_string(), "t.a < 1 OR t.a > 5");
        Ok(())
    }

    #[test]
    fn test_like() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(rewrite(like("s", "abc", false))?.to_string(), "t.s = 'abc'");
        assert_eq!(rewrite(like("s", "abc", true))?.to_string(), "t.s <> 'abc'");
        assert_eq!(rewrite(like("n", "%", false))?, Criteria::True);
        assert_eq!(rewrite(like("n", "%%", true))?, Criteria::False);
        assert_eq!(rewrite(like("s", "%", false))?.to_string(), "t.s IS NOT NULL");
        assert_eq!(
            rewrite_with(&metadata(), like("s", "%", false), true)?.to_string(),
            "t.s LIKE '%'"
        );
        assert_eq!(rewrite(like("s", "a%", false))?.to_string(), "t.s LIKE 'a%'");

        let escaped = Criteria::Like(MatchCriteria {
            left: Expression::element(Some("t"), "s", DataType::String),
            right: string("a\\%"),
            escape: Some('\\'),
            negated: false,
        });
        assert_eq!(rewrite(escaped)?.to_string(), "t.s = 'a%'");

        let unused = Criteria::Like(MatchCriteria {
            left: Expression::element(Some("t"), "s", DataType::String),
            right: string("a%"),
            escape: Some('#'),
            negated: false,
        });
        assert_eq!(rewrite(unused)?.to_string(), "t.s LIKE 'a%'");
        Ok(())
    }

    #[test]
    fn test_in() -> Result<(), Box<dyn std::error::Error>> {
        let single = Criteria::In(SetCriteria {
            expression: a(),
            values: vec![int(5)],
            negated: false,
        });
        assert_eq!(rewrite(single)?.to_string(), "t.a = 5");

        let only_null = Criteria::In(SetCriteria {
            expression: a(),
            values: vec![Expression::null(DataType::Integer)],
            negated: false,
        });
        assert_eq!(rewrite(only_null)?, Criteria::False);

        let not_in_null = Criteria::In(SetCriteria {
            expression: a(),
            values: vec![int(1), Expression::null(DataType::Integer)],
            negated: true,
        });
        assert_eq!(rewrite(not_in_null.clone())?, Criteria::False);
        assert_eq!(
            rewrite_with(&metadata(), not_in_null, true)?.to_string(),
            "t.a NOT IN (1, null)"
        );

        let duplicates = Criteria::In(SetCriteria {
            expression: a(),
            values: vec![int(1), int(2), int(1)],
            negated: false,
        });
        assert_eq!(rewrite(duplicates)?.to_string(), "t.a IN (1, 2)");

        let null_probe = Criteria::In(SetCriteria {
            expression: Expression::null(DataType::Integer),
            values: vec![int(1)],
            negated: false,
        });
        assert_eq!(rewrite(null_probe)?, Criteria::Unknown);
        Ok(())
    }

    #[test]
    fn test_in_convert_probe() -> Result<(), Box<dyn std::error::Error>> {
        let probe = Expression::convert(a(), DataType::String);
        let set = Criteria::In(SetCriteria {
            expression: probe,
            values: vec![string("1"), string("01"), string("x"), string("2")],
            negated: false,
        });
        assert_eq!(rewrite(set)?.to_string(), "t.a IN (1, 2)");
        Ok(())
    }

    #[test]
    fn test_not_in_with_null_under_not() -> Result<(), Box<dyn std::error::Error>> {
        // NOT (a IN (1, null)) is never TRUE
        let crit = Criteria::not(Criteria::In(SetCriteria {
            expression: a(),
            values: vec![int(1), Expression::null(DataType::Integer)],
            negated: false,
        }));
        let once = rewrite(crit)?;
        assert_eq!(once, Criteria::False);
        Ok(())
    }
}
