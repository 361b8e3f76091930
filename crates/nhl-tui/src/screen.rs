//! Screen — retained element tree flushed through ratatui.
//!
//! Views mutate elements (content, items, visibility) and then call
//! [`Screen::render`], which only marks a frame as pending. The event loop
//! drains the flag and draws the whole tree. Mutations that leave an element
//! unchanged do not bump the revision, which is how repeated identical
//! updates are detected.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use tracing::trace;

use crate::theme::{style_selected, C_ERROR, C_LOADING};
use crate::widgets::pane_chrome::{pane_chrome, Badge};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Loading,
    Error,
}

impl Tone {
    fn color(self) -> Color {
        match self {
            Tone::Loading => C_LOADING,
            Tone::Error => C_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Panel(Direction),
    Text,
    List,
    /// Centered above its parent, outside the parent's layout flow.
    Overlay { tone: Tone, width_pct: u16 },
}

#[derive(Debug)]
struct Node {
    kind: Kind,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    size: Constraint,
    title: Option<String>,
    badge: Option<Badge>,
    visible: bool,
    text: Text<'static>,
    items: Vec<Line<'static>>,
    selected: Option<usize>,
}

impl Node {
    fn new(kind: Kind, parent: Option<ElementId>, size: Constraint) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            size,
            title: None,
            badge: None,
            visible: true,
            text: Text::default(),
            items: Vec::new(),
            selected: None,
        }
    }
}

struct ScreenInner {
    nodes: HashMap<ElementId, Node>,
    root: ElementId,
    next_id: u64,
    focused: Option<ElementId>,
    revision: u64,
    pending: bool,
    render_requests: u64,
}

impl ScreenInner {
    fn attach(&mut self, parent: ElementId, mut node: Node, title: Option<&str>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        node.title = title.map(str::to_string);
        match self.nodes.get_mut(&parent) {
            Some(p) => p.children.push(id),
            // Parent already destroyed: the element exists but is never drawn.
            None => node.parent = None,
        }
        self.nodes.insert(id, node);
        self.revision += 1;
        id
    }

    /// Apply `f` and bump the revision only if it reports a change.
    fn mutate(&mut self, id: ElementId, f: impl FnOnce(&mut Node) -> bool) -> bool {
        let changed = self.nodes.get_mut(&id).map(f).unwrap_or(false);
        if changed {
            self.revision += 1;
        }
        changed
    }

    fn remove_subtree(&mut self, id: ElementId) -> usize {
        let Some(node) = self.nodes.remove(&id) else {
            return 0;
        };
        if self.focused == Some(id) {
            self.focused = None;
        }
        1 + node
            .children
            .iter()
            .map(|child| self.remove_subtree(*child))
            .sum::<usize>()
    }

    fn shown(&self, id: ElementId) -> bool {
        let mut cursor = id;
        loop {
            let Some(node) = self.nodes.get(&cursor) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            if cursor == self.root {
                return true;
            }
            // Detached elements are never on screen.
            match node.parent {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    fn draw_node(&self, frame: &mut Frame, id: ElementId, area: Rect) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.visible || area.width == 0 || area.height == 0 {
            return;
        }
        let focused = self.focused == Some(id);

        match &node.kind {
            Kind::Panel(direction) => {
                let inner = match &node.title {
                    Some(title) => {
                        let block = pane_chrome(title, focused, node.badge.as_ref());
                        let inner = block.inner(area);
                        frame.render_widget(block, area);
                        inner
                    }
                    None => area,
                };

                let (overlays, flow): (Vec<ElementId>, Vec<ElementId>) =
                    node.children.iter().copied().partition(|child| {
                        matches!(
                            self.nodes.get(child).map(|n| &n.kind),
                            Some(Kind::Overlay { .. })
                        )
                    });
                let flow: Vec<(ElementId, Constraint)> = flow
                    .into_iter()
                    .filter_map(|child| {
                        let n = self.nodes.get(&child)?;
                        n.visible.then_some((child, n.size))
                    })
                    .collect();

                let rects = Layout::default()
                    .direction(*direction)
                    .constraints(flow.iter().map(|(_, size)| *size).collect::<Vec<_>>())
                    .split(inner);
                for ((child, _), rect) in flow.iter().zip(rects.iter()) {
                    self.draw_node(frame, *child, *rect);
                }
                for overlay in overlays {
                    self.draw_node(frame, overlay, area);
                }
            }
            Kind::Text => {
                let mut paragraph = Paragraph::new(node.text.clone()).wrap(Wrap { trim: false });
                if let Some(title) = &node.title {
                    paragraph = paragraph.block(pane_chrome(title, focused, node.badge.as_ref()));
                }
                frame.render_widget(paragraph, area);
            }
            Kind::List => {
                let items: Vec<ListItem> = node.items.iter().cloned().map(ListItem::new).collect();
                let mut list = List::new(items)
                    .highlight_style(style_selected())
                    .highlight_symbol("▸ ");
                if let Some(title) = &node.title {
                    list = list.block(pane_chrome(title, focused, node.badge.as_ref()));
                }
                let mut state = ListState::default().with_selected(node.selected);
                frame.render_stateful_widget(list, area, &mut state);
            }
            Kind::Overlay { tone, width_pct } => {
                let height = (node.text.height() as u16).saturating_add(2);
                let rect = centered_rect(*width_pct, height.min(area.height), area);
                let mut block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(tone.color()));
                if let Some(title) = &node.title {
                    block = block.title(format!(" {} ", title));
                }
                frame.render_widget(Clear, rect);
                frame.render_widget(
                    Paragraph::new(node.text.clone())
                        .wrap(Wrap { trim: false })
                        .block(block),
                    rect,
                );
            }
        }
    }
}

/// Cloneable handle to the element tree.
#[derive(Clone)]
pub struct Screen {
    inner: Rc<RefCell<ScreenInner>>,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        let root = ElementId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node::new(Kind::Panel(Direction::Vertical), None, Constraint::Min(0)),
        );
        Self {
            inner: Rc::new(RefCell::new(ScreenInner {
                nodes,
                root,
                next_id: 1,
                focused: None,
                revision: 0,
                pending: true,
                render_requests: 0,
            })),
        }
    }

    pub fn root(&self) -> ElementId {
        self.inner.borrow().root
    }

    // ── Construction ──────────────────────────────────────────────────────────

    pub fn panel(
        &self,
        parent: ElementId,
        title: Option<&str>,
        direction: Direction,
        size: Constraint,
    ) -> ElementId {
        let node = Node::new(Kind::Panel(direction), Some(parent), size);
        self.inner.borrow_mut().attach(parent, node, title)
    }

    pub fn text(&self, parent: ElementId, title: Option<&str>, size: Constraint) -> ElementId {
        let node = Node::new(Kind::Text, Some(parent), size);
        self.inner.borrow_mut().attach(parent, node, title)
    }

    pub fn list(&self, parent: ElementId, title: Option<&str>, size: Constraint) -> ElementId {
        let node = Node::new(Kind::List, Some(parent), size);
        self.inner.borrow_mut().attach(parent, node, title)
    }

    pub fn overlay(
        &self,
        parent: ElementId,
        tone: Tone,
        title: &str,
        content: Text<'static>,
    ) -> ElementId {
        let width_pct = match tone {
            Tone::Loading => 40,
            Tone::Error => 60,
        };
        let mut node = Node::new(
            Kind::Overlay { tone, width_pct },
            Some(parent),
            Constraint::Min(0),
        );
        node.text = content;
        let id = self.inner.borrow_mut().attach(parent, node, Some(title));
        trace!("[screen] overlay {:?} ({:?}) under {:?}", id, tone, parent);
        id
    }

    // ── Mutation ──────────────────────────────────────────────────────────────

    pub fn set_content(&self, id: ElementId, content: impl Into<Text<'static>>) -> bool {
        let content = content.into();
        self.inner.borrow_mut().mutate(id, |node| {
            if node.text == content {
                return false;
            }
            node.text = content;
            true
        })
    }

    pub fn set_title(&self, id: ElementId, title: impl Into<String>) -> bool {
        let title = Some(title.into());
        self.inner.borrow_mut().mutate(id, |node| {
            if node.title == title {
                return false;
            }
            node.title = title;
            true
        })
    }

    pub fn set_badge(&self, id: ElementId, badge: Option<Badge>) -> bool {
        self.inner.borrow_mut().mutate(id, |node| {
            if node.badge == badge {
                return false;
            }
            node.badge = badge;
            true
        })
    }

    /// Replace list rows, keeping the selection within bounds.
    pub fn set_items(&self, id: ElementId, items: Vec<Line<'static>>) -> bool {
        self.inner.borrow_mut().mutate(id, |node| {
            let selected = clamp_selection(node.selected, items.len());
            if node.items == items && node.selected == selected {
                return false;
            }
            node.items = items;
            node.selected = selected;
            true
        })
    }

    pub fn select(&self, id: ElementId, index: Option<usize>) -> bool {
        self.inner.borrow_mut().mutate(id, |node| {
            let selected = clamp_selection(index, node.items.len());
            if node.selected == selected {
                return false;
            }
            node.selected = selected;
            true
        })
    }

    pub fn show(&self, id: ElementId) -> bool {
        self.inner.borrow_mut().mutate(id, |node| !std::mem::replace(&mut node.visible, true))
    }

    pub fn hide(&self, id: ElementId) -> bool {
        self.inner.borrow_mut().mutate(id, |node| std::mem::replace(&mut node.visible, false))
    }

    pub fn focus(&self, id: ElementId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.focused == Some(id) || !inner.nodes.contains_key(&id) {
            return false;
        }
        inner.focused = Some(id);
        inner.revision += 1;
        true
    }

    /// Remove an element and its subtree. Unknown or already destroyed ids are
    /// ignored.
    pub fn destroy(&self, id: ElementId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if id == inner.root {
            return false;
        }
        let parent = inner.nodes.get(&id).and_then(|n| n.parent);
        let removed = inner.remove_subtree(id);
        if removed == 0 {
            return false;
        }
        if let Some(parent) = parent.and_then(|p| inner.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }
        inner.revision += 1;
        trace!("[screen] destroyed {:?} ({} elements)", id, removed);
        true
    }

    /// Request a frame. Drawing happens in the event loop.
    pub fn render(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.pending = true;
        inner.render_requests += 1;
    }

    /// Consume the pending-frame flag.
    pub fn take_pending(&self) -> bool {
        std::mem::replace(&mut self.inner.borrow_mut().pending, false)
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let inner = self.inner.borrow();
        inner.draw_node(frame, inner.root, area);
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn exists(&self, id: ElementId) -> bool {
        self.inner.borrow().nodes.contains_key(&id)
    }

    /// Visible itself and through every ancestor up to the root.
    pub fn is_shown(&self, id: ElementId) -> bool {
        self.inner.borrow().shown(id)
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.inner.borrow().focused
    }

    /// Overlays directly under `parent`.
    pub fn overlays(&self, parent: ElementId) -> Vec<ElementId> {
        let inner = self.inner.borrow();
        inner
            .nodes
            .get(&parent)
            .map(|p| {
                p.children
                    .iter()
                    .copied()
                    .filter(|child| {
                        matches!(
                            inner.nodes.get(child).map(|n| &n.kind),
                            Some(Kind::Overlay { .. })
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Plain text of a text or overlay element.
    pub fn content(&self, id: ElementId) -> Option<String> {
        let inner = self.inner.borrow();
        let node = inner.nodes.get(&id)?;
        Some(
            node.text
                .lines
                .iter()
                .map(plain)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    pub fn items(&self, id: ElementId) -> Vec<String> {
        let inner = self.inner.borrow();
        inner
            .nodes
            .get(&id)
            .map(|n| n.items.iter().map(plain).collect())
            .unwrap_or_default()
    }

    pub fn selected(&self, id: ElementId) -> Option<usize> {
        self.inner.borrow().nodes.get(&id).and_then(|n| n.selected)
    }

    pub fn element_count(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    /// Bumped by every mutation that changed something.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    pub fn render_requests(&self) -> u64 {
        self.inner.borrow().render_requests
    }
}

fn plain(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

fn clamp_selection(index: Option<usize>, len: usize) -> Option<usize> {
    match (index, len) {
        (_, 0) => None,
        (None, _) => Some(0),
        (Some(i), len) => Some(i.min(len - 1)),
    }
}

/// Centre a box of `percent_x` width and fixed `height` inside `r`.
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}
