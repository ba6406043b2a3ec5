use serde::{Deserialize, Serialize};

use crate::store::{Entity, EntityId, Searchable, contains_term};

const ROOT_NODE_ID: &str = "root";
const ROOT_POSITION: (f64, f64) = (400.0, 300.0);
const CHILD_OFFSET_X: f64 = 160.0;
const CHILD_SPACING_Y: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Root,
    Branch,
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMap {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<MindMapNode>,
    #[serde(default)]
    pub edges: Vec<MindMapEdge>,
}

#[derive(Debug, Clone, Default)]
pub struct MindMapPatch {
    pub title: Option<String>,
    pub nodes: Option<Vec<MindMapNode>>,
    pub edges: Option<Vec<MindMapEdge>>,
}

impl MindMap {
    pub fn node(&self, node_id: &str) -> Option<&MindMapNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Attach a new node under `parent_id`, returning its id.
    ///
    /// Children of the root are branches, anything deeper is a leaf. `None`
    /// when the parent does not exist.
    pub fn add_node(&mut self, parent_id: &str, label: impl Into<String>) -> Option<String> {
        let parent = self.node(parent_id)?;
        let kind = match parent.kind {
            NodeKind::Root => NodeKind::Branch,
            NodeKind::Branch | NodeKind::Leaf => NodeKind::Leaf,
        };
        let siblings = self.edges.iter().filter(|e| e.source == parent_id).count();
        let (x, y) = (
            parent.x + CHILD_OFFSET_X,
            parent.y + CHILD_SPACING_Y * siblings as f64,
        );

        let id = self.next_node_id();
        self.nodes.push(MindMapNode {
            id: id.clone(),
            label: label.into(),
            x,
            y,
            kind,
        });
        self.edges.push(MindMapEdge {
            source: parent_id.to_string(),
            target: id.clone(),
        });
        Some(id)
    }

    pub fn move_node(&mut self, node_id: &str, x: f64, y: f64) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == node_id) {
            Some(node) => {
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    /// Remove a node together with its descendants and every edge touching
    /// them. The root cannot be removed.
    pub fn remove_node(&mut self, node_id: &str) -> bool {
        if node_id == ROOT_NODE_ID || self.node(node_id).is_none() {
            return false;
        }
        let mut doomed = vec![node_id.to_string()];
        let mut i = 0;
        while i < doomed.len() {
            let children: Vec<String> = self
                .edges
                .iter()
                .filter(|e| e.source == doomed[i] && !doomed.contains(&e.target))
                .map(|e| e.target.clone())
                .collect();
            doomed.extend(children);
            i += 1;
        }
        self.nodes.retain(|n| !doomed.contains(&n.id));
        self.edges
            .retain(|e| !doomed.contains(&e.source) && !doomed.contains(&e.target));
        true
    }

    fn next_node_id(&self) -> String {
        let highest = self
            .nodes
            .iter()
            .filter_map(|n| n.id.strip_prefix("node-"))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("node-{}", highest + 1)
    }
}

impl Entity for MindMap {
    const COLLECTION: &'static str = "mindmaps";
    type Patch = MindMapPatch;

    fn id(&self) -> EntityId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn with_id(id: EntityId) -> Self {
        MindMap {
            id,
            title: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn apply(&mut self, patch: MindMapPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(nodes) = patch.nodes {
            self.nodes = nodes;
        }
        if let Some(edges) = patch.edges {
            self.edges = edges;
        }
    }

    // A new map starts with a single root node named after it
    fn on_create(&mut self) {
        if self.nodes.is_empty() {
            self.nodes.push(MindMapNode {
                id: ROOT_NODE_ID.to_string(),
                label: self.title.clone(),
                x: ROOT_POSITION.0,
                y: ROOT_POSITION.1,
                kind: NodeKind::Root,
            });
        }
    }
}

impl Searchable for MindMap {
    fn matches_search(&self, term: &str) -> bool {
        contains_term(&self.title, term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> MindMap {
        let mut map = MindMap::with_id(1);
        map.apply(MindMapPatch {
            title: Some("Career".into()),
            ..MindMapPatch::default()
        });
        map.on_create();
        map
    }

    #[test]
    fn created_with_root_node() {
        let map = map();
        assert_eq!(map.nodes.len(), 1);
        assert_eq!(map.nodes[0].label, "Career");
        assert_eq!(map.nodes[0].kind, NodeKind::Root);
    }

    #[test]
    fn children_become_branches_then_leaves() {
        let mut map = map();
        let skills = map.add_node("root", "Skills").unwrap();
        let rust = map.add_node(&skills, "Rust").unwrap();
        assert_eq!(map.node(&skills).unwrap().kind, NodeKind::Branch);
        assert_eq!(map.node(&rust).unwrap().kind, NodeKind::Leaf);
        assert_eq!(map.edges.len(), 2);
        assert!(map.add_node("missing", "x").is_none());
    }

    #[test]
    fn removing_a_branch_drops_its_subtree() {
        let mut map = map();
        let skills = map.add_node("root", "Skills").unwrap();
        map.add_node(&skills, "Rust").unwrap();
        let network = map.add_node("root", "Network").unwrap();

        assert!(map.remove_node(&skills));
        let ids: Vec<&str> = map.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", network.as_str()]);
        assert_eq!(map.edges.len(), 1);
        assert!(!map.remove_node("root"));
    }

    #[test]
    fn move_node_updates_position() {
        let mut map = map();
        assert!(map.move_node("root", 10.0, 20.0));
        assert_eq!(map.node("root").map(|n| (n.x, n.y)), Some((10.0, 20.0)));
        assert!(!map.move_node("nope", 0.0, 0.0));
    }
}
