//! Predicate trees. TRUE, FALSE and UNKNOWN are the resolved three valued outcomes
//! and compare by value like every other variant.
use std::fmt::{self, Display, Formatter};

use super::expression::display_list;
use super::{Command, ElementSymbol, Expression};

#[derive(Clone, Debug, PartialEq)]
pub enum Criteria {
    True,
    False,
    Unknown,
    Compare(CompareCriteria),
    Like(MatchCriteria),
    Between(BetweenCriteria),
    In(SetCriteria),
    IsNull(IsNullCriteria),
    Compound(CompoundCriteria),
    Not(Box<Criteria>),
    Exists(ExistsCriteria),
    SubqueryCompare(SubqueryCompareCriteria),
    SubqueryIn(SubquerySetCriteria),
    Has(CriteriaSelector),
    Translate(TranslateCriteria),
    /// A boolean valued expression used as a predicate
    Expression(Expression),
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompareOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOperator {
    /// The operator that keeps the meaning when both sides trade places.
    pub fn flip(&self) -> CompareOperator {
        match self {
            CompareOperator::Lt => CompareOperator::Gt,
            CompareOperator::Gt => CompareOperator::Lt,
            CompareOperator::Le => CompareOperator::Ge,
            CompareOperator::Ge => CompareOperator::Le,
            o => *o,
        }
    }

    /// The logical complement, valid only once both sides are known to be non null.
    pub fn negate(&self) -> CompareOperator {
        match self {
            CompareOperator::Eq => CompareOperator::Ne,
            CompareOperator::Ne => CompareOperator::Eq,
            CompareOperator::Lt => CompareOperator::Ge,
            CompareOperator::Ge => CompareOperator::Lt,
            CompareOperator::Gt => CompareOperator::Le,
            CompareOperator::Le => CompareOperator::Gt,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOperator::Eq => "=",
            CompareOperator::Ne => "<>",
            CompareOperator::Lt => "<",
            CompareOperator::Gt => ">",
            CompareOperator::Le => "<=",
            CompareOperator::Ge => ">=",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompareCriteria {
    pub left: Expression,
    pub operator: CompareOperator,
    pub right: Expression,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchCriteria {
    pub left: Expression,
    pub right: Expression,
    pub escape: Option<char>,
    pub negated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BetweenCriteria {
    pub expression: Expression,
    pub lower: Expression,
    pub upper: Expression,
    pub negated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetCriteria {
    pub expression: Expression,
    pub values: Vec<Expression>,
    pub negated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IsNullCriteria {
    pub expression: Expression,
    pub negated: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompoundOperator {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompoundCriteria {
    pub operator: CompoundOperator,
    pub criteria: Vec<Criteria>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExistsCriteria {
    pub command: Box<Command>,
    pub negated: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quantifier {
    Some,
    Any,
    All,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubqueryCompareCriteria {
    pub left: Expression,
    pub operator: CompareOperator,
    pub quantifier: Quantifier,
    pub command: Box<Command>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubquerySetCriteria {
    pub expression: Expression,
    pub command: Box<Command>,
    pub negated: bool,
}

/// The predicate shape a HAS or TRANSLATE selector looks for in the user criteria.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectorType {
    Any,
    Compare(CompareOperator),
    Like,
    In,
    IsNull,
    Between,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CriteriaSelector {
    pub selector_type: SelectorType,
    /// Empty means any element
    pub elements: Vec<ElementSymbol>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TranslateCriteria {
    pub selector: CriteriaSelector,
    pub translations: Vec<(ElementSymbol, Expression)>,
}

impl Criteria {
    pub fn compare(left: Expression, operator: CompareOperator, right: Expression) -> Criteria {
        Criteria::Compare(CompareCriteria {
            left,
            operator,
            right,
        })
    }

    pub fn is_null(expression: Expression, negated: bool) -> Criteria {
        Criteria::IsNull(IsNullCriteria {
            expression,
            negated,
        })
    }

    pub fn and(criteria: Vec<Criteria>) -> Criteria {
        Criteria::Compound(CompoundCriteria {
            operator: CompoundOperator::And,
            criteria,
        })
    }

    pub fn or(criteria: Vec<Criteria>) -> Criteria {
        Criteria::Compound(CompoundCriteria {
            operator: CompoundOperator::Or,
            criteria,
        })
    }

    pub fn not(criteria: Criteria) -> Criteria {
        Criteria::Not(Box::new(criteria))
    }

    pub fn from_bool(b: Option<bool>) -> Criteria {
        match b {
            Some(true) => Criteria::True,
            Some(false) => Criteria::False,
            None => Criteria::Unknown,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Criteria::True | Criteria::False | Criteria::Unknown)
    }

    /// Splits a predicate into its top level conjuncts.
    pub fn conjuncts(&self) -> Vec<&Criteria> {
        match self {
            Criteria::Compound(c) if c.operator == CompoundOperator::And => {
                c.criteria.iter().flat_map(|c| c.conjuncts()).collect()
            }
            c => vec![c],
        }
    }
}

impl Display for SelectorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SelectorType::Any => Ok(()),
            SelectorType::Compare(o) => write!(f, "{} ", o.symbol()),
            SelectorType::Like => write!(f, "LIKE "),
            SelectorType::In => write!(f, "IN "),
            SelectorType::IsNull => write!(f, "IS NULL "),
            SelectorType::Between => write!(f, "BETWEEN "),
        }
    }
}

impl Display for CriteriaSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}CRITERIA", self.selector_type)?;
        if !self.elements.is_empty() {
            write!(f, " ON ({})", display_list(&self.elements))?;
        }
        Ok(())
    }
}

impl Display for Criteria {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let not = |negated: bool| if negated { "NOT " } else { "" };
        match self {
            Criteria::True => write!(f, "1 = 1"),
            Criteria::False => write!(f, "1 = 0"),
            Criteria::Unknown => write!(f, "UNKNOWN"),
            Criteria::Compare(c) => write!(f, "{} {} {}", c.left, c.operator.symbol(), c.right),
            Criteria::Like(m) => {
                write!(f, "{} {}LIKE {}", m.left, not(m.negated), m.right)?;
                if let Some(e) = m.escape {
                    write!(f, " ESCAPE '{}'", e)?;
                }
                Ok(())
            }
            Criteria::Between(b) => write!(
                f,
                "{} {}BETWEEN {} AND {}",
                b.expression,
                not(b.negated),
                b.lower,
                b.upper
            ),
            Criteria::In(s) => write!(
                f,
                "{} {}IN ({})",
                s.expression,
                not(s.negated),
                display_list(&s.values)
            ),
            Criteria::IsNull(i) => write!(f, "{} IS {}NULL", i.expression, not(i.negated)),
            Criteria::Compound(c) => {
                let op = match c.operator {
                    CompoundOperator::And => " AND ",
                    CompoundOperator::Or => " OR ",
                };
                let parts: Vec<String> = c
                    .criteria
                    .iter()
                    .map(|child| match child {
                        Criteria::Compound(_) => format!("({})", child),
                        _ => child.to_string(),
                    })
                    .collect();
                write!(f, "{}", parts.join(op))
            }
            Criteria::Not(c) => write!(f, "NOT ({})", c),
            Criteria::Exists(e) => write!(f, "{}EXISTS ({})", not(e.negated), e.command),
            Criteria::SubqueryCompare(s) => {
                let q = match s.quantifier {
                    Quantifier::Some => "SOME",
                    Quantifier::Any => "ANY",
                    Quantifier::All => "ALL",
                };
                write!(f, "{} {} {} ({})", s.left, s.operator.symbol(), q, s.command)
            }
            Criteria::SubqueryIn(s) => {
                write!(f, "{} {}IN ({})", s.expression, not(s.negated), s.command)
            }
            Criteria::Has(s) => write!(f, "HAS {}", s),
            Criteria::Translate(t) => {
                write!(f, "TRANSLATE {}", t.selector)?;
                if !t.translations.is_empty() {
                    let parts: Vec<String> = t
                        .translations
                        .iter()
                        .map(|(e, x)| format!("{} = {}", e, x))
                        .collect();
                    write!(f, " WITH ({})", parts.join(", "))?;
                }
                Ok(())
            }
            Criteria::Expression(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{DataType, Value};
    use super::*;

    #[test]
    fn test_sentinels_compare_by_value() {
        assert_eq!(Criteria::from_bool(Some(true)), Criteria::True);
        assert_ne!(Criteria::Unknown, Criteria::False);
        assert!(Criteria::from_bool(None).is_sentinel());
    }

    #[test]
    fn test_operators() {
        for op in [
            CompareOperator::Eq,
            CompareOperator::Ne,
            CompareOperator::Lt,
            CompareOperator::Gt,
            CompareOperator::Le,
            CompareOperator::Ge,
        ] {
            assert_eq!(op.flip().flip(), op);
            assert_eq!(op.negate().negate(), op);
        }
        assert_eq!(CompareOperator::Lt.flip(), CompareOperator::Gt);
        assert_eq!(CompareOperator::Lt.negate(), CompareOperator::Ge);
    }

    #[test]
    fn test_conjuncts_and_display() {
        let a = Expression::element(None, "a", DataType::Integer);
        let crit = Criteria::and(vec![
            Criteria::compare(a.clone(), CompareOperator::Eq, Expression::constant(Value::Integer(1))),
            Criteria::and(vec![
                Criteria::is_null(a.clone(), true),
                Criteria::or(vec![Criteria::True, Criteria::False]),
            ]),
        ]);
        assert_eq!(crit.conjuncts().len(), 3);
        assert_eq!(
            crit.to_string(),
            "a = 1 AND (a IS NOT NULL AND (1 = 1 OR 1 = 0))"
        );
    }
}
