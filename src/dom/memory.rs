use std::collections::HashMap;

use ego_tree::{NodeId as TreeId, NodeRef, Tree};
use scraper::{ElementRef, Html, Node, Selector};

use crate::dom::host::{DomError, Fragment, HostDom, NodeId, Placement, escape_html};
use crate::notify::toast::ToastStack;
use crate::notify::{Clipboard, ClipboardError, Notification, NotificationSink};
use crate::signal::events::{EventSource, HostEvent};
use crate::signal::navigation::{History, NavSource};

/// A value written through the bound-value setter, with the synthetic
/// `input` event that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub node: NodeId,
    pub value: String,
}

/// In-process host page backed by a parsed HTML document.
///
/// Stands in for the browser: tests and the `replay` command drive it
/// directly, editing markup the way the host framework would and reading back
/// what the engine injected.
pub struct MemoryHost {
    document: Html,
    path: String,
    handles: HashMap<TreeId, NodeId>,
    nodes: HashMap<NodeId, TreeId>,
    next_handle: u64,
    selectors: HashMap<String, Selector>,
    values: HashMap<NodeId, String>,
    input_events: Vec<InputEvent>,
    styles: Vec<String>,
    pending_mutations: u32,
    pending_events: Vec<HostEvent>,
    clipboard: Vec<String>,
    clipboard_broken: bool,
    toasts: ToastStack,
    visited: Vec<String>,
    idle: bool,
    replaced: bool,
}

impl MemoryHost {
    pub fn from_html(path: &str, html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            path: path.to_string(),
            handles: HashMap::new(),
            nodes: HashMap::new(),
            next_handle: 1,
            selectors: HashMap::new(),
            values: HashMap::new(),
            input_events: Vec::new(),
            styles: Vec::new(),
            pending_mutations: 0,
            pending_events: Vec::new(),
            clipboard: Vec::new(),
            clipboard_broken: false,
            toasts: ToastStack::default(),
            visited: vec![path.to_string()],
            idle: true,
            replaced: false,
        }
    }

    pub fn with_toasts(mut self, toasts: ToastStack) -> Self {
        self.toasts = toasts;
        self
    }

    /// Pretend the host has no idle-callback facility.
    pub fn without_idle(mut self) -> Self {
        self.idle = false;
        self
    }

    // ------------------------------------------------------------------
    // Host-side simulation
    // ------------------------------------------------------------------

    /// Route change that bypasses the history API entirely.
    pub fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
        self.visited.push(path.to_string());
    }

    /// Browser back/forward.
    pub fn pop_state(&mut self, path: &str) {
        self.set_path(path);
        self.pending_events.push(HostEvent::Navigation {
            source: NavSource::PopState,
        });
    }

    /// Full document load (F5 or a non-SPA link). Every existing handle goes
    /// stale and the next event poll reports the document as replaced.
    pub fn reload(&mut self, path: &str, html: &str) {
        self.document = Html::parse_document(html);
        self.handles.clear();
        self.nodes.clear();
        self.values.clear();
        self.styles.clear();
        self.pending_mutations = 0;
        self.pending_events.clear();
        self.replaced = true;
        self.set_path(path);
    }

    pub fn queue_event(&mut self, event: HostEvent) {
        self.pending_events.push(event);
    }

    /// Re-render the whole body, as a client-side route transition would.
    pub fn replace_body(&mut self, html: &str) -> Result<(), DomError> {
        let body = self.find("body")?.into_iter().next().ok_or_else(|| {
            DomError::Fragment("document has no <body>".into())
        })?;
        let body_id = self.live(body)?;
        self.clear_children(body_id);

        let parsed = Html::parse_fragment(html);
        for child in parsed.root_element().children() {
            let grafted = graft(&mut self.document.tree, child);
            if let Some(mut parent) = self.document.tree.get_mut(body_id) {
                parent.append_id(grafted);
            }
            self.touch();
        }
        Ok(())
    }

    pub fn find(&mut self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        self.query_all(None, selector)
    }

    pub fn count(&mut self, selector: &str) -> usize {
        self.find(selector).map(|found| found.len()).unwrap_or(0)
    }

    pub fn clipboard(&self) -> &[String] {
        &self.clipboard
    }

    pub fn break_clipboard(&mut self) {
        self.clipboard_broken = true;
    }

    pub fn toasts(&self) -> &ToastStack {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastStack {
        &mut self.toasts
    }

    pub fn notifications(&self) -> &[Notification] {
        self.toasts.history()
    }

    pub fn input_events(&self) -> &[InputEvent] {
        &self.input_events
    }

    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Serialized document, for inspection.
    pub fn html(&self) -> String {
        self.document.root_element().html()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn touch(&mut self) {
        self.pending_mutations = self.pending_mutations.saturating_add(1);
    }

    fn handle(&mut self, id: TreeId) -> NodeId {
        if let Some(handle) = self.handles.get(&id) {
            return *handle;
        }
        let handle = NodeId(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(id, handle);
        self.nodes.insert(handle, id);
        handle
    }

    fn connected(&self, id: TreeId) -> bool {
        let root = self.document.tree.root().id();
        match self.document.tree.get(id) {
            Some(node) => id == root || node.ancestors().last().map(|a| a.id()) == Some(root),
            None => false,
        }
    }

    /// Tree id of a node that is still in the document.
    fn live(&self, node: NodeId) -> Result<TreeId, DomError> {
        match self.nodes.get(&node) {
            Some(id) if self.connected(*id) => Ok(*id),
            _ => Err(DomError::Detached(node)),
        }
    }

    fn selector(&mut self, selector: &str) -> Result<Selector, DomError> {
        if let Some(cached) = self.selectors.get(selector) {
            return Ok(cached.clone());
        }
        let parsed = Selector::parse(selector).map_err(|e| DomError::Selector {
            selector: selector.to_string(),
            reason: format!("{:?}", e),
        })?;
        self.selectors.insert(selector.to_string(), parsed.clone());
        Ok(parsed)
    }

    fn clear_children(&mut self, id: TreeId) {
        let children: Vec<TreeId> = match self.document.tree.get(id) {
            Some(node) => node.children().map(|c| c.id()).collect(),
            None => return,
        };
        for child in children {
            if let Some(mut node) = self.document.tree.get_mut(child) {
                node.detach();
            }
        }
    }

    fn element_parts(&self, id: TreeId) -> Option<(String, Vec<(String, String)>)> {
        let node = self.document.tree.get(id)?;
        let element = ElementRef::wrap(node)?;
        let attrs = element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((element.value().name().to_string(), attrs))
    }

    fn rewrite_attributes<F>(&mut self, node: NodeId, edit: F) -> Result<(), DomError>
    where
        F: FnOnce(&mut Vec<(String, String)>),
    {
        let id = self.live(node)?;
        let (tag, mut attrs) = self
            .element_parts(id)
            .ok_or_else(|| DomError::Fragment(format!("{} is not an element", node)))?;
        edit(&mut attrs);
        let replacement = build_element(&tag, &attrs)?;
        if let Some(mut target) = self.document.tree.get_mut(id) {
            *target.value() = replacement;
        }
        self.touch();
        Ok(())
    }
}

fn first_element(parsed: &Html) -> Option<NodeRef<'_, Node>> {
    parsed
        .root_element()
        .children()
        .find(|child| child.value().is_element())
}

fn build_element(tag: &str, attrs: &[(String, String)]) -> Result<Node, DomError> {
    let rendered: String = attrs
        .iter()
        .map(|(k, v)| format!(" {}=\"{}\"", k, escape_html(v)))
        .collect();
    let markup = format!("<{tag}{rendered}></{tag}>");
    let parsed = Html::parse_fragment(&markup);
    first_element(&parsed)
        .map(|node| node.value().clone())
        .ok_or(DomError::Fragment(markup))
}

/// Deep-copy `source` (from another document) into `tree` as an orphan.
fn graft(tree: &mut Tree<Node>, source: NodeRef<'_, Node>) -> TreeId {
    let id = tree.orphan(source.value().clone()).id();
    for child in source.children() {
        let child_id = graft(tree, child);
        if let Some(mut parent) = tree.get_mut(id) {
            parent.append_id(child_id);
        }
    }
    id
}

impl HostDom for MemoryHost {
    fn location_path(&mut self) -> Result<String, DomError> {
        Ok(self.path.clone())
    }

    fn query_all(&mut self, scope: Option<NodeId>, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = self.selector(selector)?;
        let root = match scope {
            Some(node) => self.live(node)?,
            None => self.document.tree.root().id(),
        };
        let found: Vec<TreeId> = match self.document.tree.get(root) {
            Some(root) => root
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .filter(|el| selector.matches(el))
                .map(|el| NodeRef::id(&el))
                .collect(),
            None => Vec::new(),
        };
        Ok(found.into_iter().map(|id| self.handle(id)).collect())
    }

    fn text_content(&mut self, node: NodeId) -> Result<String, DomError> {
        let id = self.live(node)?;
        let text = self
            .document
            .tree
            .get(id)
            .and_then(ElementRef::wrap)
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();
        Ok(text)
    }

    fn attribute(&mut self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let id = self.live(node)?;
        Ok(self
            .document
            .tree
            .get(id)
            .and_then(ElementRef::wrap)
            .and_then(|el| el.value().attr(name).map(str::to_string)))
    }

    fn closest(&mut self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let selector = self.selector(selector)?;
        let id = self.live(node)?;
        let found = self.document.tree.get(id).and_then(|start| {
            std::iter::once(start)
                .chain(start.ancestors())
                .filter_map(ElementRef::wrap)
                .find(|el| selector.matches(el))
                .map(|el| NodeRef::id(&el))
        });
        Ok(found.map(|id| self.handle(id)))
    }

    fn is_connected(&mut self, node: NodeId) -> Result<bool, DomError> {
        Ok(self.live(node).is_ok())
    }

    fn insert(&mut self, fragment: &Fragment, placement: Placement) -> Result<NodeId, DomError> {
        let target = self.live(placement.target())?;
        let parsed = Html::parse_fragment(&fragment.html);
        let source = first_element(&parsed).ok_or_else(|| DomError::Fragment(fragment.html.clone()))?;
        let grafted = graft(&mut self.document.tree, source);

        let mut anchor = self
            .document
            .tree
            .get_mut(target)
            .ok_or(DomError::Detached(placement.target()))?;
        match placement {
            Placement::After(_) => {
                anchor.insert_id_after(grafted);
            }
            Placement::Before(_) => {
                anchor.insert_id_before(grafted);
            }
            Placement::Append(_) => {
                anchor.append_id(grafted);
            }
        }
        self.touch();
        Ok(self.handle(grafted))
    }

    fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        let id = self.live(node)?;
        if let Some(mut target) = self.document.tree.get_mut(id) {
            target.detach();
        }
        self.touch();
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        let id = self.live(node)?;
        self.clear_children(id);
        if !text.is_empty() {
            let parsed = Html::parse_fragment(&escape_html(text));
            let text_node = parsed
                .root_element()
                .children()
                .find(|child| child.value().is_text())
                .map(|child| child.value().clone());
            if let (Some(text_node), Some(mut target)) = (text_node, self.document.tree.get_mut(id)) {
                target.append(text_node);
            }
        }
        self.touch();
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.rewrite_attributes(node, |attrs| {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some(existing) => existing.1 = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        })
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.rewrite_attributes(node, |attrs| attrs.retain(|(k, _)| k != name))
    }

    fn value(&mut self, node: NodeId) -> Result<String, DomError> {
        if let Some(value) = self.values.get(&node) {
            self.live(node)?;
            return Ok(value.clone());
        }
        Ok(self.attribute(node, "value")?.unwrap_or_default())
    }

    fn set_bound_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.live(node)?;
        self.values.insert(node, value.to_string());
        self.input_events.push(InputEvent {
            node,
            value: value.to_string(),
        });
        self.touch();
        Ok(())
    }

    fn add_style(&mut self, css: &str) -> Result<(), DomError> {
        self.styles.push(css.to_string());
        self.touch();
        Ok(())
    }

    fn supports_idle(&self) -> bool {
        self.idle
    }
}

impl MemoryHost {
    /// User typing into a control (not a bound-value write).
    pub fn type_into(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.live(node)?;
        self.values.insert(node, value.to_string());
        Ok(())
    }
}

impl History for MemoryHost {
    fn push_state(&mut self, url: &str) {
        self.set_path(path_of(url));
    }

    fn replace_state(&mut self, url: &str) {
        self.path = path_of(url).to_string();
        if let Some(last) = self.visited.last_mut() {
            *last = self.path.clone();
        }
    }
}

fn path_of(url: &str) -> &str {
    let path = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
        }
        None => url,
    };
    match path.find(['?', '#']) {
        Some(end) => &path[..end],
        None => path,
    }
}

impl Clipboard for MemoryHost {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.clipboard_broken {
            return Err(ClipboardError("clipboard access denied".into()));
        }
        self.clipboard.push(text.to_string());
        Ok(())
    }
}

impl NotificationSink for MemoryHost {
    fn notify(&mut self, notification: Notification) {
        self.toasts.notify(notification);
    }
}

impl EventSource for MemoryHost {
    fn poll_events(&mut self) -> Result<Vec<HostEvent>, DomError> {
        if std::mem::take(&mut self.replaced) {
            return Err(DomError::Replaced);
        }
        let mut events = std::mem::take(&mut self.pending_events);
        if self.pending_mutations > 0 {
            events.push(HostEvent::Mutations {
                count: self.pending_mutations,
            });
            self.pending_mutations = 0;
        }
        Ok(events)
    }
}
