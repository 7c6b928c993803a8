//! Decoder Boundary - Layered Document Walk
//!
//! The document decoder is an external collaborator; this module only
//! models its node tree far enough to rebuild segment hierarchies (group
//! names prefixing layer names) and assign sequential stacking orders.
//! Pixels never pass through here.

use serde::{Deserialize, Serialize};

use crate::names::build_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Group,
    Layer,
}

/// One node of a decoded layered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentNode {
    pub name: String,
    pub kind: NodeKind,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn root(children: Vec<DocumentNode>) -> Self {
        Self {
            name: String::new(),
            kind: NodeKind::Root,
            width: 0,
            height: 0,
            children,
        }
    }

    pub fn group(name: &str, children: Vec<DocumentNode>) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::Group,
            width: 0,
            height: 0,
            children,
        }
    }

    pub fn layer(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::Layer,
            width,
            height,
            children: Vec::new(),
        }
    }
}

/// A node paired with the group names above it (root excluded).
#[derive(Debug, Clone)]
pub struct WalkItem<'a> {
    pub node: &'a DocumentNode,
    pub prefix: Vec<String>,
}

/// Pre-order depth-first traversal with an explicit stack; document
/// nesting depth never touches the call stack.
pub fn walk(root: &DocumentNode) -> Walk<'_> {
    Walk {
        stack: vec![WalkItem {
            node: root,
            prefix: Vec::new(),
        }],
    }
}

pub struct Walk<'a> {
    stack: Vec<WalkItem<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.stack.pop()?;

        let mut child_prefix = item.prefix.clone();
        if item.node.kind == NodeKind::Group {
            child_prefix.push(item.node.name.clone());
        }
        for child in item.node.children.iter().rev() {
            self.stack.push(WalkItem {
                node: child,
                prefix: child_prefix.clone(),
            });
        }

        Some(item)
    }
}

/// Layers in visit order with their full segment path and a sequential
/// stacking order starting at 0.
pub fn layer_names(root: &DocumentNode) -> Vec<(Vec<String>, u32)> {
    let mut out = Vec::new();
    let mut order = 0u32;
    for item in walk(root) {
        if item.node.kind != NodeKind::Layer {
            continue;
        }
        let mut segments = item.prefix.clone();
        segments.push(item.node.name.clone());
        out.push((segments, order));
        order += 1;
    }
    out
}

/// The on-disk names (codec form, no extension) an extraction of this
/// document would write.
pub fn export_names(root: &DocumentNode) -> Vec<String> {
    layer_names(root)
        .iter()
        .map(|(segments, order)| build_name(segments, *order))
        .collect()
}
