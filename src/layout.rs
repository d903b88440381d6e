//! A minimal host document model and the [`LayoutAdapter`] that mounts the
//! sidebar into it.
//!
//! Hosts without a real DOM (the headless binary, tests) describe their
//! layout with [`Document`]; the adapter finds the root element by tag and
//! the content regions by class, exactly like a browser host would.

use crate::panel::{
    layout_css, wrapper_style, ContentRegion, LayoutAdapter, RegionSnapshot, ViewHandle,
    CONTENT_PATCH,
};

pub const DEFAULT_ROOT_TAG: &str = "app-root";
pub const DEFAULT_CONTENT_CLASS: &str = "content";
pub const WRAPPER_CLASS: &str = "ssh-sidebar-wrapper";
pub const VIEW_TAG: &str = "ssh-sidebar";
pub const STYLE_ELEMENT_ID: &str = "ssh-sidebar-layout-css";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Ordered inline declarations, serialized as `prop: value; prop: value`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineStyle {
    decls: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn parse(text: &str) -> Self {
        let decls = text
            .split(';')
            .filter_map(|decl| {
                let (prop, value) = decl.split_once(':')?;
                let prop = prop.trim();
                let value = value.trim();
                if prop.is_empty() || value.is_empty() {
                    return None;
                }
                Some((prop.to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        Self { decls }
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(p, _)| p == prop)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces in place, or appends a new declaration.
    pub fn set(&mut self, prop: &str, value: &str) {
        match self.decls.iter_mut().find(|(p, _)| p == prop) {
            Some(decl) => decl.1 = value.to_string(),
            None => self.decls.push((prop.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, prop: &str) {
        self.decls.retain(|(p, _)| p != prop);
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn css_text(&self) -> String {
        self.decls
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub style: InlineStyle,
    pub text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Arena-backed element tree with a `head` and a `body`.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Option<Element>>,
    head: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            head: NodeId(0),
            body: NodeId(0),
        };
        doc.head = doc.create_element("head");
        doc.body = doc.create_element("body");
        doc
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Some(Element {
            tag: tag.to_string(),
            ..Element::default()
        }));
        NodeId(self.nodes.len() - 1)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.element(id).and_then(|e| e.parent)
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(p) = self.element_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.element_mut(child) {
            c.parent = None;
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, first: bool) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        self.detach(child);
        if let Some(p) = self.element_mut(parent) {
            if first {
                p.children.insert(0, child);
            } else {
                p.children.push(child);
            }
        }
        if let Some(c) = self.element_mut(child) {
            c.parent = Some(parent);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child, false);
    }

    pub fn insert_first_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child, true);
    }

    /// Detaches `id` and frees it together with its subtree.
    pub fn remove(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(el) = self.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(el.children);
            }
        }
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent(p);
        }
        depth
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|id| self.element(*id).map(|e| e.tag == tag).unwrap_or(false))
    }

    pub fn find_by_class(&self, within: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(within)
            .into_iter()
            .filter(|id| self.element(*id).map(|e| e.has_class(class)).unwrap_or(false))
            .collect()
    }

    pub fn find_by_attr(&self, within: NodeId, name: &str, value: &str) -> Vec<NodeId> {
        self.descendants(within)
            .into_iter()
            .filter(|id| {
                self.element(*id)
                    .and_then(|e| e.attr(name))
                    .map(|v| v == value)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            if !el.has_class(class) {
                el.classes.push(class.to_string());
            }
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            match el.attrs.iter_mut().find(|(n, _)| n == name) {
                Some(attr) => attr.1 = value.to_string(),
                None => el.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn style_text(&self, id: NodeId) -> String {
        self.element(id)
            .map(|e| e.style.css_text())
            .unwrap_or_default()
    }

    pub fn set_style_text(&mut self, id: NodeId, text: &str) {
        if let Some(el) = self.element_mut(id) {
            el.style = InlineStyle::parse(text);
        }
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`LayoutAdapter`] over a [`Document`].
#[derive(Clone, Debug)]
pub struct DocumentLayout {
    doc: Document,
    root_tag: String,
    content_class: String,
}

impl DocumentLayout {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            root_tag: DEFAULT_ROOT_TAG.to_string(),
            content_class: DEFAULT_CONTENT_CLASS.to_string(),
        }
    }

    pub fn with_selectors(mut self, root_tag: &str, content_class: &str) -> Self {
        self.root_tag = root_tag.to_string();
        self.content_class = content_class.to_string();
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }
}

impl LayoutAdapter for DocumentLayout {
    fn locate_root(&self) -> Option<NodeId> {
        self.doc.find_by_tag(&self.root_tag)
    }

    fn locate_content_regions(&self, root: NodeId) -> Vec<ContentRegion> {
        self.doc
            .find_by_class(root, &self.content_class)
            .into_iter()
            .map(|node| ContentRegion {
                node,
                depth: self.doc.depth(node),
            })
            .collect()
    }

    fn insert_panel(&mut self, root: NodeId, view: &ViewHandle, width: u32) -> NodeId {
        let wrapper = self.doc.create_element("div");
        self.doc.add_class(wrapper, WRAPPER_CLASS);
        self.doc.set_style_text(wrapper, &wrapper_style(width));

        let view_node = self.doc.create_element(VIEW_TAG);
        self.doc
            .set_attr(view_node, "data-view-id", &view.id().to_string());
        self.doc.append_child(wrapper, view_node);

        self.doc.insert_first_child(root, wrapper);
        wrapper
    }

    fn remove_panel(&mut self, wrapper: NodeId) {
        self.doc.remove(wrapper);
    }

    fn inject_style(&mut self, root: NodeId) -> NodeId {
        let style = self.doc.create_element("style");
        self.doc.set_attr(style, "id", STYLE_ELEMENT_ID);
        let tag = self
            .doc
            .element(root)
            .map(|e| e.tag.clone())
            .unwrap_or_else(|| self.root_tag.clone());
        if let Some(el) = self.doc.element_mut(style) {
            el.text = layout_css(&tag);
        }
        let head = self.doc.head();
        self.doc.append_child(head, style);
        style
    }

    fn remove_style(&mut self, style: NodeId) {
        self.doc.remove(style);
    }

    fn patch(&mut self, regions: &[NodeId]) -> Vec<RegionSnapshot> {
        regions
            .iter()
            .filter_map(|node| {
                let el = self.doc.element_mut(*node)?;
                let snapshot = RegionSnapshot {
                    node: *node,
                    css_text: el.style.css_text(),
                };
                for (prop, value) in CONTENT_PATCH {
                    el.style.set(prop, value);
                }
                Some(snapshot)
            })
            .collect()
    }

    fn restore(&mut self, snapshots: &[RegionSnapshot]) {
        for snapshot in snapshots {
            self.doc.set_style_text(snapshot.node, &snapshot.css_text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_style_normalizes_and_round_trips() {
        let style = InlineStyle::parse("width:100vw ;  HEIGHT: 10px;;bogus");
        assert_eq!(style.css_text(), "width: 100vw; height: 10px");
        assert_eq!(InlineStyle::parse(&style.css_text()), style);
    }

    #[test]
    fn inline_style_set_replaces_in_place() {
        let mut style = InlineStyle::parse("a: 1; b: 2");
        style.set("a", "3");
        style.set("c", "4");
        assert_eq!(style.css_text(), "a: 3; b: 2; c: 4");
        style.remove("b");
        assert_eq!(style.get("b"), None);
    }

    #[test]
    fn remove_frees_subtree() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(doc.body(), outer);
        doc.append_child(outer, inner);
        assert_eq!(doc.len(), 4);
        doc.remove(outer);
        assert_eq!(doc.len(), 2);
        assert!(!doc.contains(inner));
        assert!(doc.children(doc.body()).is_empty());
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.append_child(doc.body(), a);
        doc.append_child(a, b);
        doc.append_child(doc.body(), c);
        assert_eq!(doc.descendants(doc.body()), [a, b, c]);
        assert_eq!(doc.depth(b), 2);
    }

    #[test]
    fn insert_first_child_moves_before_existing() {
        let mut doc = Document::new();
        let first = doc.create_element("first");
        let second = doc.create_element("second");
        doc.append_child(doc.body(), first);
        doc.insert_first_child(doc.body(), second);
        assert_eq!(doc.children(doc.body()), [second, first]);
    }
}
