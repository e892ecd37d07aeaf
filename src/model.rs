//! Core data model for the market heatmap.
//! The raw JSON tree is flattened into an index-based arena so that nodes
//! can hold parent back-links without reference cycles.

use serde::Deserialize;

/// A node as it appears in `data.json`. Internal nodes carry `name` and
/// `children`; leaves carry `name`, `value` and `rate`. The root may also
/// carry `rate`, which colors the header band.
#[derive(Clone, Debug, Deserialize)]
pub struct RawNode {
    pub name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub children: Option<Vec<RawNode>>,
}

pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    /// Supplied for leaves; for internal nodes, computed by `accumulate`.
    /// A missing leaf value enters the sums as NaN and is not detected.
    pub value: f64,
    pub rate: Option<f64>,
    pub parent: Option<NodeId>,
    /// `None` exactly for leaves. A present-but-empty list is an internal
    /// node whose aggregate is 0. Built once at load, never mutated.
    pub children: Option<Vec<NodeId>>,
    pub depth: u32,
    /// Rectangle in treemap coordinates. Recomputed for a subtree each
    /// time it becomes the zoom target.
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn child_ids(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// Arena of the whole market tree. Index 0 is always the root.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub const ROOT: NodeId = 0;

    /// Builds the arena from the fetched document and aggregates values
    /// bottom-up. The tree is fully annotated after this call.
    pub fn from_raw(raw: &RawNode) -> Self {
        let mut tree = Tree { nodes: Vec::new() };
        tree.insert(raw, None, 0);
        tree.accumulate(Self::ROOT);
        tree
    }

    fn insert(&mut self, raw: &RawNode, parent: Option<NodeId>, depth: u32) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            name: raw.name.clone(),
            value: raw.value.unwrap_or(f64::NAN),
            rate: raw.rate,
            parent,
            children: raw.children.as_ref().map(|_| Vec::new()),
            depth,
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: 0.0,
        });
        if let Some(raw_children) = &raw.children {
            let mut ids = Vec::with_capacity(raw_children.len());
            for child in raw_children {
                ids.push(self.insert(child, Some(id), depth + 1));
            }
            self.nodes[id].children = Some(ids);
        }
        id
    }

    /// Recursive sum of leaf values. Leaves return their supplied value;
    /// internal nodes store and return the sum over their children.
    pub fn accumulate(&mut self, id: NodeId) -> f64 {
        let Some(children) = self.nodes[id].children.clone() else {
            return self.nodes[id].value;
        };
        let total = children.into_iter().map(|c| self.accumulate(c)).sum();
        self.nodes[id].value = total;
        total
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, value: f64, rate: f64) -> RawNode {
        RawNode {
            name: name.into(),
            value: Some(value),
            rate: Some(rate),
            children: None,
        }
    }

    fn branch(name: &str, children: Vec<RawNode>) -> RawNode {
        RawNode {
            name: name.into(),
            value: None,
            rate: None,
            children: Some(children),
        }
    }

    #[test]
    fn aggregates_internal_values_bottom_up() {
        let raw = branch(
            "Mercado",
            vec![
                branch("A", vec![leaf("a1", 10.0, 0.0), leaf("a2", 20.0, 0.0)]),
                branch("B", vec![leaf("b1", 5.0, 0.0)]),
            ],
        );
        let tree = Tree::from_raw(&raw);
        assert_eq!(tree.get(Tree::ROOT).value, 35.0);
        let a = tree.get(Tree::ROOT).child_ids()[0];
        let b = tree.get(Tree::ROOT).child_ids()[1];
        assert_eq!(tree.get(a).value, 30.0);
        assert_eq!(tree.get(b).value, 5.0);
    }

    #[test]
    fn market_example_sums_within_tolerance() {
        let json = r#"{
            "name": "Mercado",
            "children": [
                { "name": "TECNOLOGIA", "children": [
                    { "name": "LUAN1", "value": 600.84, "rate": -2.31 },
                    { "name": "LUAN2", "value": 399.16, "rate": 2.31 }
                ] }
            ]
        }"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        let tree = Tree::from_raw(&raw);
        let tecnologia = tree.get(Tree::ROOT).child_ids()[0];
        assert!((tree.get(tecnologia).value - 1000.0).abs() < 1e-9);
        assert!((tree.get(Tree::ROOT).value - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn leaf_test_is_children_field_absence() {
        let raw = branch("root", vec![leaf("x", 1.0, 0.0), branch("empty", vec![])]);
        let tree = Tree::from_raw(&raw);
        let x = tree.get(Tree::ROOT).child_ids()[0];
        let empty = tree.get(Tree::ROOT).child_ids()[1];
        assert!(tree.get(x).is_leaf());
        assert!(!tree.get(empty).is_leaf());
        // present-but-empty children aggregate to 0
        assert_eq!(tree.get(empty).value, 0.0);
        assert_eq!(tree.get(Tree::ROOT).value, 1.0);
    }

    #[test]
    fn missing_leaf_value_poisons_ancestor_sums() {
        let raw = branch(
            "root",
            vec![
                leaf("ok", 3.0, 0.0),
                RawNode {
                    name: "broken".into(),
                    value: None,
                    rate: None,
                    children: None,
                },
            ],
        );
        let tree = Tree::from_raw(&raw);
        assert!(tree.get(Tree::ROOT).value.is_nan());
    }

    #[test]
    fn parent_links_give_upward_navigation() {
        let raw = branch("root", vec![branch("mid", vec![leaf("deep", 1.0, 0.0)])]);
        let tree = Tree::from_raw(&raw);
        let mid = tree.get(Tree::ROOT).child_ids()[0];
        let deep = tree.get(mid).child_ids()[0];
        assert_eq!(tree.get(deep).parent, Some(mid));
        assert_eq!(tree.get(mid).parent, Some(Tree::ROOT));
        assert_eq!(tree.get(Tree::ROOT).parent, None);
        assert_eq!(tree.get(deep).depth, 2);
    }
}
