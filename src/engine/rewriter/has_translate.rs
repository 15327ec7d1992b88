//! HAS CRITERIA and TRANSLATE CRITERIA inside virtual procedures. Both look at the
//! criteria the user placed on the procedure call.
use super::{ProcedureContext, Rewriter, RewriterError};
use crate::engine::objects::{Criteria, CriteriaSelector, Expression, SelectorType, TranslateCriteria};

impl<'a> Rewriter<'a> {
    pub(super) fn rewrite_has(&self, selector: &CriteriaSelector, ctx: &ProcedureContext) -> Criteria {
        let user_criteria = match ctx.user_criteria() {
            Some(c) => c,
            None => return Criteria::False,
        };
        let found = user_criteria
            .conjuncts()
            .into_iter()
            .any(|c| selector_matches(selector, c));
        trace!("HAS {} on {} is {}", selector, user_criteria, found);
        Criteria::from_bool(Some(found))
    }

    /// The matching user conjuncts with the translations applied. Failures keep the node.
    pub(super) fn rewrite_translate(
        &self,
        translate: TranslateCriteria,
        ctx: &ProcedureContext,
        preserve_unknown: bool,
    ) -> Result<Criteria, RewriterError> {
        let user_criteria = match ctx.user_criteria() {
            Some(c) => c,
            None => return Ok(Criteria::True),
        };
        let mut matching: Vec<Criteria> = user_criteria
            .conjuncts()
            .into_iter()
            .filter(|c| selector_matches(&translate.selector, c))
            .cloned()
            .map(|c| {
                c.map_expressions(&mut |e| match e {
                    Expression::Element(element) => translate
                        .translations
                        .iter()
                        .find(|(symbol, _)| symbol.matches(element))
                        .map(|(_, replacement)| self.retype(replacement.clone(), element.data_type)),
                    _ => None,
                })
            })
            .collect();

        let translated = match matching.len() {
            0 => return Ok(Criteria::True),
            1 => matching.remove(0),
            _ => Criteria::and(matching),
        };
        debug!("Translated {} into {}", translate.selector, translated);
        match self.rewrite_criteria(translated, ctx, preserve_unknown) {
            Ok(c) => Ok(c),
            Err(e) => {
                warn!("Unable to rewrite translated criteria, keeping {}: {}", translate.selector, e);
                Ok(Criteria::Translate(translate))
            }
        }
    }
}

/// A user conjunct fits a selector when it has the right shape and touches one of its elements.
fn selector_matches(selector: &CriteriaSelector, criteria: &Criteria) -> bool {
    let shape = match (selector.selector_type, criteria) {
        (_, c) if c.is_sentinel() => false,
        (SelectorType::Any, _) => true,
        (SelectorType::Compare(op), Criteria::Compare(c)) => c.operator == op,
        (SelectorType::Like, Criteria::Like(_))
        | (SelectorType::In, Criteria::In(_))
        | (SelectorType::In, Criteria::SubqueryIn(_))
        | (SelectorType::IsNull, Criteria::IsNull(_))
        | (SelectorType::Between, Criteria::Between(_)) => true,
        _ => false,
    };
    if !shape {
        return false;
    }
    if selector.elements.is_empty() {
        return true;
    }
    criteria
        .elements()
        .iter()
        .any(|e| selector.elements.iter().any(|s| s.matches(e)))
}
