//! Structural walks over expressions and criteria. None of these descend into
//! nested commands, a subquery is a boundary.
use super::{
    AliasSymbol, BetweenCriteria, CaseExpression, CompareCriteria, CompoundCriteria, Criteria,
    ElementSymbol, Expression, IsNullCriteria, MatchCriteria, SearchedCaseExpression, SetCriteria,
    SubqueryCompareCriteria, SubquerySetCriteria, TranslateCriteria,
};

impl Expression {
    /// Direct children, in evaluation order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Function(f) => f.args.iter().collect(),
            Expression::Case(c) => {
                let mut out = vec![c.expression.as_ref()];
                for (w, t) in c.whens.iter().zip(c.thens.iter()) {
                    out.push(w);
                    out.push(t);
                }
                out.extend(c.else_expression.as_deref());
                out
            }
            Expression::SearchedCase(c) => {
                let mut out: Vec<&Expression> = c.thens.iter().collect();
                out.extend(c.else_expression.as_deref());
                out
            }
            Expression::Aggregate(a) => a.arg.as_deref().into_iter().collect(),
            Expression::Alias(a) => vec![a.expression.as_ref()],
            _ => vec![],
        }
    }

    pub fn collect_elements(&self, out: &mut Vec<ElementSymbol>) {
        match self {
            Expression::Element(e) => {
                if !out.contains(e) {
                    out.push(e.clone())
                }
            }
            Expression::SearchedCase(c) => {
                for w in &c.whens {
                    w.collect_elements(out);
                }
                for child in self.children() {
                    child.collect_elements(out);
                }
            }
            _ => {
                for child in self.children() {
                    child.collect_elements(out);
                }
            }
        }
    }

    pub fn elements(&self) -> Vec<ElementSymbol> {
        let mut out = vec![];
        self.collect_elements(&mut out);
        out
    }

    pub fn has_subquery(&self) -> bool {
        match self {
            Expression::ScalarSubquery(_) => true,
            Expression::SearchedCase(c) => {
                c.whens.iter().any(|w| w.has_subquery())
                    || self.children().iter().any(|e| e.has_subquery())
            }
            _ => self.children().iter().any(|e| e.has_subquery()),
        }
    }

    pub fn has_aggregate(&self) -> bool {
        match self {
            Expression::Aggregate(_) => true,
            Expression::SearchedCase(c) => {
                c.whens.iter().any(|w| w.has_aggregate())
                    || self.children().iter().any(|e| e.has_aggregate())
            }
            _ => self.children().iter().any(|e| e.has_aggregate()),
        }
    }

    /// Pre-order replacement. Where `f` yields a replacement the subtree is not visited further.
    pub fn map_expressions(self, f: &mut dyn FnMut(&Expression) -> Option<Expression>) -> Expression {
        if let Some(replacement) = f(&self) {
            return replacement;
        }
        match self {
            Expression::Function(mut func) => {
                func.args = func.args.into_iter().map(|a| a.map_expressions(f)).collect();
                Expression::Function(func)
            }
            Expression::Case(c) => Expression::Case(CaseExpression {
                expression: Box::new(c.expression.map_expressions(f)),
                whens: c.whens.into_iter().map(|w| w.map_expressions(f)).collect(),
                thens: c.thens.into_iter().map(|t| t.map_expressions(f)).collect(),
                else_expression: c.else_expression.map(|e| Box::new(e.map_expressions(f))),
                data_type: c.data_type,
            }),
            Expression::SearchedCase(c) => Expression::SearchedCase(SearchedCaseExpression {
                whens: c.whens.into_iter().map(|w| w.map_expressions(f)).collect(),
                thens: c.thens.into_iter().map(|t| t.map_expressions(f)).collect(),
                else_expression: c.else_expression.map(|e| Box::new(e.map_expressions(f))),
                data_type: c.data_type,
            }),
            Expression::Aggregate(mut a) => {
                a.arg = a.arg.map(|e| Box::new(e.map_expressions(f)));
                Expression::Aggregate(a)
            }
            Expression::Alias(a) => Expression::Alias(AliasSymbol {
                name: a.name,
                expression: Box::new(a.expression.map_expressions(f)),
            }),
            e => e,
        }
    }
}

impl Criteria {
    /// Expressions directly held by this predicate, nested predicates excluded.
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Criteria::Compare(c) => vec![&c.left, &c.right],
            Criteria::Like(m) => vec![&m.left, &m.right],
            Criteria::Between(b) => vec![&b.expression, &b.lower, &b.upper],
            Criteria::In(s) => {
                let mut out = vec![&s.expression];
                out.extend(s.values.iter());
                out
            }
            Criteria::IsNull(i) => vec![&i.expression],
            Criteria::SubqueryCompare(s) => vec![&s.left],
            Criteria::SubqueryIn(s) => vec![&s.expression],
            Criteria::Expression(e) => vec![e],
            _ => vec![],
        }
    }

    fn nested(&self) -> Vec<&Criteria> {
        match self {
            Criteria::Compound(c) => c.criteria.iter().collect(),
            Criteria::Not(c) => vec![c.as_ref()],
            _ => vec![],
        }
    }

    pub fn collect_elements(&self, out: &mut Vec<ElementSymbol>) {
        for e in self.expressions() {
            e.collect_elements(out);
        }
        for c in self.nested() {
            c.collect_elements(out);
        }
    }

    pub fn elements(&self) -> Vec<ElementSymbol> {
        let mut out = vec![];
        self.collect_elements(&mut out);
        out
    }

    pub fn has_subquery(&self) -> bool {
        match self {
            Criteria::Exists(_) | Criteria::SubqueryCompare(_) | Criteria::SubqueryIn(_) => true,
            c => {
                c.expressions().iter().any(|e| e.has_subquery())
                    || c.nested().iter().any(|n| n.has_subquery())
            }
        }
    }

    pub fn has_aggregate(&self) -> bool {
        self.expressions().iter().any(|e| e.has_aggregate())
            || self.nested().iter().any(|n| n.has_aggregate())
    }

    /// Applies [`Expression::map_expressions`] to every expression in the predicate.
    pub fn map_expressions(self, f: &mut dyn FnMut(&Expression) -> Option<Expression>) -> Criteria {
        match self {
            Criteria::Compare(c) => Criteria::Compare(CompareCriteria {
                left: c.left.map_expressions(f),
                operator: c.operator,
                right: c.right.map_expressions(f),
            }),
            Criteria::Like(m) => Criteria::Like(MatchCriteria {
                left: m.left.map_expressions(f),
                right: m.right.map_expressions(f),
                escape: m.escape,
                negated: m.negated,
            }),
            Criteria::Between(b) => Criteria::Between(BetweenCriteria {
                expression: b.expression.map_expressions(f),
                lower: b.lower.map_expressions(f),
                upper: b.upper.map_expressions(f),
                negated: b.negated,
            }),
            Criteria::In(s) => Criteria::In(SetCriteria {
                expression: s.expression.map_expressions(f),
                values: s.values.into_iter().map(|v| v.map_expressions(f)).collect(),
                negated: s.negated,
            }),
            Criteria::IsNull(i) => Criteria::IsNull(IsNullCriteria {
                expression: i.expression.map_expressions(f),
                negated: i.negated,
            }),
            Criteria::Compound(c) => Criteria::Compound(CompoundCriteria {
                operator: c.operator,
                criteria: c.criteria.into_iter().map(|c| c.map_expressions(f)).collect(),
            }),
            Criteria::Not(c) => Criteria::Not(Box::new(c.map_expressions(f))),
            Criteria::SubqueryCompare(s) => Criteria::SubqueryCompare(SubqueryCompareCriteria {
                left: s.left.map_expressions(f),
                operator: s.operator,
                quantifier: s.quantifier,
                command: s.command,
            }),
            Criteria::SubqueryIn(s) => Criteria::SubqueryIn(SubquerySetCriteria {
                expression: s.expression.map_expressions(f),
                command: s.command,
                negated: s.negated,
            }),
            Criteria::Translate(t) => Criteria::Translate(TranslateCriteria {
                selector: t.selector,
                translations: t
                    .translations
                    .into_iter()
                    .map(|(e, x)| (e, x.map_expressions(f)))
                    .collect(),
            }),
            Criteria::Expression(e) => Criteria::Expression(e.map_expressions(f)),
            c => c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{DataType, Value};
    use super::super::CompareOperator;
    use super::*;

    #[test]
    fn test_elements_are_unique() {
        let a = Expression::element(Some("t"), "a", DataType::Integer);
        let expr = Expression::function(
            "+",
            vec![a.clone(), a.clone()],
            DataType::Integer,
        );
        assert_eq!(expr.elements().len(), 1);
    }

    #[test]
    fn test_map_replaces_subtrees() {
        let a = Expression::element(Some("t"), "a", DataType::Integer);
        let crit = Criteria::compare(
            Expression::function(
                "+",
                vec![a.clone(), Expression::constant(Value::Integer(1))],
                DataType::Integer,
            ),
            CompareOperator::Gt,
            a.clone(),
        );
        let mapped = crit.map_expressions(&mut |e| match e {
            Expression::Element(_) => Some(Expression::element(Some("v"), "x", DataType::Integer)),
            _ => None,
        });
        assert_eq!(mapped.to_string(), "(v.x + 1) > v.x");
    }
}
