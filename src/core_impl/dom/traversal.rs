use super::*;

impl Dom {
    pub(crate) fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub(crate) fn child_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        self.nodes[node_id.0]
            .children
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    pub(crate) fn previous_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let siblings = &self.nodes[parent.0].children;
        let pos = siblings.iter().position(|id| *id == node_id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|id| self.element(*id).is_some())
    }

    pub(crate) fn next_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let siblings = &self.nodes[parent.0].children;
        let pos = siblings.iter().position(|id| *id == node_id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|id| self.element(*id).is_some())
    }

    /// Element siblings before `node_id`, nearest first.
    pub(crate) fn previous_element_siblings(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.previous_element_sibling(node_id);
        while let Some(sibling) = cursor {
            out.push(sibling);
            cursor = self.previous_element_sibling(sibling);
        }
        out
    }

    /// 1-based position among element siblings.
    pub(crate) fn element_index(&self, node_id: NodeId) -> Option<usize> {
        let parent = self.parent(node_id)?;
        self.child_elements(parent)
            .iter()
            .position(|id| *id == node_id)
            .map(|pos| pos + 1)
    }

    pub(crate) fn collect_elements_descendants_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        let mut stack = self.nodes[node_id.0]
            .children
            .iter()
            .rev()
            .copied()
            .collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if self.element(node).is_some() {
                out.push(node);
            }
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
    }

    pub(crate) fn descendant_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements_descendants_dfs(node_id, &mut out);
        out
    }

    pub(crate) fn all_element_nodes(&self) -> Vec<NodeId> {
        self.descendant_elements(self.root)
    }

    /// Nearest inclusive ancestor carrying `class_name`.
    pub(crate) fn closest_with_class(&self, node_id: NodeId, class_name: &str) -> Option<NodeId> {
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if self.has_class(current, class_name) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub(crate) fn find_ancestor_by_tag(&self, node_id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if self.tag_name(current) == Some(tag) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }
}
