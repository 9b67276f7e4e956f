use crate::selector::{
    SelectorCombinator, SelectorPart, SelectorPseudoClass, SelectorStep, parse_selector_groups,
};

use super::*;

impl Dom {
    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.query_selector_all_from(self.root, selector)
    }

    pub(crate) fn query_selector_all_from(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        Ok(self
            .descendant_elements(root)
            .into_iter()
            .filter(|candidate| {
                groups
                    .iter()
                    .any(|chain| self.matches_selector_chain(*candidate, chain))
            })
            .collect())
    }

    pub(crate) fn matches_selector_chain(&self, node_id: NodeId, chain: &[SelectorPart]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.matches_step(node_id, &last.step) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }

        // Descendant and general-sibling combinators backtrack over every
        // candidate, not only the nearest one.
        match last.combinator.unwrap_or(SelectorCombinator::Descendant) {
            SelectorCombinator::Child => self
                .parent(node_id)
                .is_some_and(|parent| self.matches_selector_chain(parent, rest)),
            SelectorCombinator::Descendant => {
                let mut cursor = self.parent(node_id);
                while let Some(ancestor) = cursor {
                    if self.matches_selector_chain(ancestor, rest) {
                        return true;
                    }
                    cursor = self.parent(ancestor);
                }
                false
            }
            SelectorCombinator::AdjacentSibling => self
                .previous_element_sibling(node_id)
                .is_some_and(|sibling| self.matches_selector_chain(sibling, rest)),
            SelectorCombinator::GeneralSibling => self
                .previous_element_siblings(node_id)
                .into_iter()
                .any(|sibling| self.matches_selector_chain(sibling, rest)),
        }
    }

    pub(crate) fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };

        if let Some(tag) = &step.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &step.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }
        if !step
            .classes
            .iter()
            .all(|class_name| has_class(element, class_name))
        {
            return false;
        }
        if !step.attrs.iter().all(|cond| cond.matches(element)) {
            return false;
        }

        step.pseudo_classes.iter().all(|pseudo| match pseudo {
            SelectorPseudoClass::FirstChild => self.previous_element_sibling(node_id).is_none(),
            SelectorPseudoClass::LastChild => self.next_element_sibling(node_id).is_none(),
            SelectorPseudoClass::Empty => self.nodes[node_id.0].children.is_empty(),
            SelectorPseudoClass::NthChild(n) => self.element_index(node_id) == Some(*n),
            SelectorPseudoClass::Not(groups) => !groups
                .iter()
                .any(|chain| self.matches_selector_chain(node_id, chain)),
        })
    }
}
