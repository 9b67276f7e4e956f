use crate::core_impl::parse_html;
use crate::core_impl::sequences::{
    self, InsertSummary, RenumberSummary, is_adder_link, is_remove_button,
};
use crate::runtime_state::TraceState;
use crate::{Dom, Error, NodeId, Result, class_tokens, truncate_chars};

/// How an adder's stored template is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateEncoding {
    #[default]
    Uri,
    Base64,
}

/// Pointer event that activates add links and remove buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivationEvent {
    #[default]
    Click,
    MouseDown,
}

impl ActivationEvent {
    fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::MouseDown => "mousedown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub activation: ActivationEvent,
    pub template_encoding: TemplateEncoding,
    /// Text of injected `a.adderlink` controls.
    pub add_label: String,
    /// Text of injected `span.remove` controls.
    pub remove_label: String,
    /// Text of injected `div.handle` controls.
    pub handle_label: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            activation: ActivationEvent::Click,
            template_encoding: TemplateEncoding::Uri,
            add_label: "Add".to_string(),
            remove_label: "delete".to_string(),
            handle_label: "drag me".to_string(),
        }
    }
}

impl EngineOptions {
    fn validate(&self) -> Result<()> {
        for (setting, value) in [
            ("add_label", &self.add_label),
            ("remove_label", &self.remove_label),
            ("handle_label", &self.handle_label),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Dom(format!("{setting} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Owns a form document and applies sequence add, remove and reorder
/// actions to it, keeping positional names contiguous.
///
/// Every mutating call runs against a copy of the document and only replaces
/// it on success, so an error leaves the markup untouched.
#[derive(Debug)]
pub struct SequenceEngine {
    dom: Dom,
    options: EngineOptions,
    trace_state: TraceState,
}

enum Action {
    Add(NodeId),
    Remove(NodeId),
}

impl SequenceEngine {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_options(html, EngineOptions::default())
    }

    pub fn from_html_with_options(html: &str, options: EngineOptions) -> Result<Self> {
        options.validate()?;
        let dom = stacker::grow(8 * 1024 * 1024, || parse_html(html))?;
        Ok(Self {
            dom,
            options,
            trace_state: TraceState::default(),
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn set_activation(&mut self, activation: ActivationEvent) {
        self.options.activation = activation;
    }

    pub fn set_template_encoding(&mut self, encoding: TemplateEncoding) {
        self.options.template_encoding = encoding;
    }

    /// Replaces the affordance labels. Already injected controls pick up the
    /// new text on the next synchronisation.
    pub fn set_labels(&mut self, add: &str, remove: &str, handle: &str) -> Result<()> {
        let options = EngineOptions {
            add_label: add.to_string(),
            remove_label: remove.to_string(),
            handle_label: handle.to_string(),
            ..self.options.clone()
        };
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Wires add links, remove buttons and drag handles for the whole
    /// document. Safe to call more than once.
    pub fn init(&mut self) -> Result<()> {
        self.transact(sequences::sync_affordances)?;
        let adders = self.count("a.adderlink")?;
        let removers = self.count("span.remove")?;
        let handles = self.count("div.handle")?;
        self.trace_state.sequence_line(format!(
            "[sequence] init adderlinks={adders} removers={removers} handles={handles}"
        ));
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        self.dispatch(selector, ActivationEvent::Click)
    }

    pub fn mousedown(&mut self, selector: &str) -> Result<()> {
        self.dispatch(selector, ActivationEvent::MouseDown)
    }

    /// Drags the item owning `handle_selector` onto the item containing
    /// `target_selector`.
    pub fn drag(&mut self, handle_selector: &str, target_selector: &str) -> Result<()> {
        let handle = self.select_one(handle_selector)?;
        let target = self.select_one(target_selector)?;
        self.trace_state.event_line(format!(
            "[event] drag handle={} target={}",
            self.trace_node_label(handle),
            self.trace_node_label(target)
        ));
        let summary =
            self.transact(|dom, options| sequences::move_item(dom, handle, target, options))?;
        self.trace_state.sequence_line(format!(
            "[sequence] reorder id={} from={} to={} items={}",
            summary.moved_id, summary.from, summary.to, summary.renumbered.items
        ));
        Ok(())
    }

    /// Runs the add action of `adder_link_selector` as configured by the
    /// sequence's batch count. Returns the new item indices.
    pub fn add_items(&mut self, adder_link_selector: &str) -> Result<Vec<usize>> {
        let link = self.select_adder_link(adder_link_selector)?;
        let summary = self.transact(|dom, options| sequences::add_items(dom, link, options))?;
        self.trace_insert(&summary);
        Ok(summary.indices)
    }

    /// Inserts exactly one item, ignoring the batch count.
    pub fn add_item(&mut self, adder_link_selector: &str) -> Result<usize> {
        let link = self.select_adder_link(adder_link_selector)?;
        let summary = self.transact(|dom, options| sequences::add_item(dom, link, options))?;
        self.trace_insert(&summary);
        summary
            .indices
            .first()
            .copied()
            .ok_or_else(|| Error::Template("no item was inserted".into()))
    }

    /// Removes the item containing the node at `selector`.
    pub fn remove_item(&mut self, selector: &str) -> Result<()> {
        let node = self.select_one(selector)?;
        self.run_remove(node)
    }

    pub fn renumber(&mut self) -> Result<()> {
        let summary = self.transact(|dom, _| sequences::renumber_all_forms(dom))?;
        self.trace_renumber(&summary);
        Ok(())
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.dom.attr(target, name).map(str::to_string))
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.dom.query_selector_all(selector)?.len())
    }

    /// `(name, value)` pairs of the named controls under `form_selector`, in
    /// document order.
    pub fn named_controls(&self, form_selector: &str) -> Result<Vec<(String, String)>> {
        let form = self.select_one(form_selector)?;
        let controls = self
            .dom
            .query_selector_all_from(form, "input[name], select[name], textarea[name]")?;
        Ok(controls
            .into_iter()
            .filter_map(|node| {
                let name = self.dom.attr(node, "name")?.to_string();
                Some((name, self.control_value(node)))
            })
            .collect())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub fn to_html(&self) -> String {
        self.dom.dump_node(self.dom.root)
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn assert_attr(&self, selector: &str, name: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.attr(target, name).unwrap_or_default();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: format!("{selector} [{name}]"),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_count(&self, selector: &str, expected: usize) -> Result<()> {
        let matches = self.dom.query_selector_all(selector)?;
        if matches.len() != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: matches.len().to_string(),
                dom_snippet: matches
                    .first()
                    .map(|node| self.node_snippet(*node))
                    .unwrap_or_default(),
            });
        }
        Ok(())
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_state.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_state.events = enabled;
    }

    pub fn set_trace_sequences(&mut self, enabled: bool) {
        self.trace_state.sequences = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Dom(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_state.log_limit = max_entries;
        while self.trace_state.logs.len() > self.trace_state.log_limit {
            self.trace_state.logs.pop_front();
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.logs.drain(..).collect()
    }

    fn dispatch(&mut self, selector: &str, event: ActivationEvent) -> Result<()> {
        let target = self.select_one(selector)?;
        let action = self.action_for(target);
        let active = event == self.options.activation;
        let label = match (&action, active) {
            (Some(Action::Add(_)), true) => "add",
            (Some(Action::Remove(_)), true) => "remove",
            _ => "none",
        };
        self.trace_state.event_line(format!(
            "[event] {} target={} action={label}",
            event.as_str(),
            self.trace_node_label(target)
        ));
        if !active {
            return Ok(());
        }

        match action {
            Some(Action::Add(link)) => {
                let summary =
                    self.transact(|dom, options| sequences::add_items(dom, link, options))?;
                self.trace_insert(&summary);
                Ok(())
            }
            Some(Action::Remove(button)) => self.run_remove(button),
            None => Ok(()),
        }
    }

    /// Handlers are resolved from classes at event time; the event bubbles
    /// from the target to the first injected control.
    fn action_for(&self, target: NodeId) -> Option<Action> {
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            if is_adder_link(&self.dom, node) {
                return Some(Action::Add(node));
            }
            if is_remove_button(&self.dom, node) {
                return Some(Action::Remove(node));
            }
            cursor = self.dom.parent(node);
        }
        None
    }

    fn run_remove(&mut self, node: NodeId) -> Result<()> {
        let summary = self.transact(|dom, options| sequences::remove_item(dom, node, options))?;
        self.trace_state.sequence_line(format!(
            "[sequence] remove id={} sequences={} items={}",
            summary.removed_id, summary.renumbered.sequences, summary.renumbered.items
        ));
        Ok(())
    }

    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut Dom, &EngineOptions) -> Result<T>,
    ) -> Result<T> {
        let mut staged = self.dom.clone();
        let out = op(&mut staged, &self.options)?;
        staged.compact();
        self.dom = staged;
        Ok(out)
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn select_adder_link(&self, selector: &str) -> Result<NodeId> {
        let node = self.select_one(selector)?;
        if !is_adder_link(&self.dom, node) {
            return Err(Error::Template(format!("{selector} is not an a.adderlink")));
        }
        Ok(node)
    }

    fn control_value(&self, node: NodeId) -> String {
        match self.dom.tag_name(node) {
            Some("textarea") => self.dom.text_content(node),
            Some("select") => {
                let options = self
                    .dom
                    .query_selector_all_from(node, "option")
                    .unwrap_or_default();
                let chosen = options
                    .iter()
                    .copied()
                    .find(|option| self.dom.attr(*option, "selected").is_some())
                    .or_else(|| options.first().copied());
                chosen
                    .map(|option| {
                        self.dom
                            .attr(option, "value")
                            .map(str::to_string)
                            .unwrap_or_else(|| self.dom.text_content(option))
                    })
                    .unwrap_or_default()
            }
            _ => self.dom.attr(node, "value").unwrap_or_default().to_string(),
        }
    }

    fn trace_insert(&mut self, summary: &InsertSummary) {
        let indices = summary
            .indices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.trace_state.sequence_line(format!(
            "[sequence] add name={} indices={indices}",
            summary.adder_name
        ));
    }

    fn trace_renumber(&mut self, summary: &RenumberSummary) {
        self.trace_state.sequence_line(format!(
            "[sequence] renumber sequences={} items={}",
            summary.sequences, summary.items
        ));
    }

    fn trace_node_label(&self, node: NodeId) -> String {
        if let Some(id) = self.dom.attr(node, "id") {
            if !id.is_empty() {
                return format!("#{id}");
            }
        }
        let Some(tag) = self.dom.tag_name(node) else {
            return format!("node-{}", node.0);
        };
        let classes = class_tokens(self.dom.attr(node, "class"));
        if classes.is_empty() {
            tag.to_string()
        } else {
            format!("{tag}.{}", classes.join("."))
        }
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }
}
