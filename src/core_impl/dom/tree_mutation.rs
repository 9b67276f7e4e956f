use super::*;

impl Dom {
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child, "appendChild")?;
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<()> {
        self.check_insertable(parent, child, "insertBefore")?;
        if self.parent(reference) != Some(parent) {
            return Err(Error::Dom(
                "insertBefore reference is not a direct child".into(),
            ));
        }
        if child == reference {
            return Ok(());
        }

        self.detach(child);
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == reference)
            .ok_or_else(|| Error::Dom("insertBefore reference is missing".into()))?;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        Ok(())
    }

    pub(crate) fn insert_after(&mut self, target: NodeId, child: NodeId) -> Result<()> {
        let parent = self
            .parent(target)
            .ok_or_else(|| Error::Dom("after target is detached".into()))?;
        if child == target {
            return Ok(());
        }
        self.detach(child);
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == target)
            .ok_or_else(|| Error::Dom("after target is detached".into()))?;
        let next = self.nodes[parent.0].children.get(pos + 1).copied();
        match next {
            Some(next) => self.insert_before(parent, child, next),
            None => self.append_child(parent, child),
        }
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(Error::Dom("cannot remove document root".into()));
        }
        if self.parent(node).is_none() {
            return Ok(());
        }
        self.detach(node);
        Ok(())
    }

    /// Copies `source_node` and its subtree from another document into this
    /// one as a detached node.
    pub(crate) fn import_subtree(&mut self, source: &Dom, source_node: NodeId) -> Result<NodeId> {
        stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || {
            let node_type = match &source.nodes[source_node.0].node_type {
                NodeType::Document => {
                    return Err(Error::Dom("cannot import a document node".into()));
                }
                other => other.clone(),
            };
            let node = self.create_node(None, node_type);
            for child in &source.nodes[source_node.0].children {
                let imported = self.import_subtree(source, *child)?;
                self.nodes[imported.0].parent = Some(node);
                self.nodes[node.0].children.push(imported);
            }
            Ok(node)
        })
    }

    /// Drops every node that is no longer reachable from the root and
    /// renumbers the rest in document order. Outstanding `NodeId`s are
    /// invalidated.
    pub(crate) fn compact(&mut self) {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        if order.len() == self.nodes.len() {
            return;
        }

        let mut remap = vec![None; self.nodes.len()];
        for (new_index, old) in order.iter().enumerate() {
            remap[old.0] = Some(NodeId(new_index));
        }
        let mut old_nodes = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        self.nodes = order
            .iter()
            .filter_map(|old| old_nodes[old.0].take())
            .map(|mut node| {
                node.parent = node.parent.and_then(|parent| remap[parent.0]);
                node.children = node
                    .children
                    .iter()
                    .filter_map(|child| remap[child.0])
                    .collect();
                node
            })
            .collect();
        self.root = NodeId(0);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(old_parent) = self.parent(node) {
            self.nodes[old_parent.0].children.retain(|id| *id != node);
        }
        self.nodes[node.0].parent = None;
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId, op: &str) -> Result<()> {
        let parent_ok = matches!(
            self.nodes.get(parent.0).map(|n| &n.node_type),
            Some(NodeType::Document | NodeType::Element(_))
        );
        if !parent_ok {
            return Err(Error::Dom(format!("{op} target cannot have children")));
        }
        if child == self.root || child == parent || child.0 >= self.nodes.len() {
            return Err(Error::Dom(format!("invalid {op} node")));
        }
        // The parent must not sit inside the child's subtree.
        if self.is_descendant_of(parent, child) {
            return Err(Error::Dom(format!("{op} would create a cycle")));
        }
        Ok(())
    }
}
