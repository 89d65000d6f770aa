//! Addressing and traversal of lineage trees.
//!
//! A forest is a slice of root individuals, each owning its descendants.
//! Nodes are addressed by a [`NodePath`]: the root's index in the forest
//! followed by child indices down to the node.

use std::collections::HashSet;
use std::fmt;

use rand::Rng;

use super::Individual;

/// Location of a node inside a forest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path to the root at `index`.
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path to a node given the root index and the child indices below it.
    pub fn from_parts(root: usize, below: &[usize]) -> Self {
        let mut steps = Vec::with_capacity(below.len() + 1);
        steps.push(root);
        steps.extend_from_slice(below);
        Self(steps)
    }

    /// Path to this node's `index`-th child.
    pub fn child(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(index);
        Self(steps)
    }

    /// Index of the root this path starts from.
    pub fn root_index(&self) -> usize {
        self.0[0]
    }

    /// Number of edges between the root and this node.
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("/"))
    }
}

/// Resolve a path against a forest.
pub fn node<'a>(forest: &'a [Individual], path: &NodePath) -> Option<&'a Individual> {
    let (&root, below) = path.0.split_first()?;
    let mut current = forest.get(root)?;
    for &step in below {
        current = current.descendants().get(step)?;
    }
    Some(current)
}

/// Resolve a path against a forest, mutably.
pub fn node_mut<'a>(forest: &'a mut [Individual], path: &NodePath) -> Option<&'a mut Individual> {
    let (&root, below) = path.0.split_first()?;
    let mut current = forest.get_mut(root)?;
    for &step in below {
        current = current.descendants_mut().get_mut(step)?;
    }
    Some(current)
}

/// Every node of the forest in pre-order, paired with its path.
pub fn flatten_with_paths(forest: &[Individual]) -> Vec<(NodePath, &Individual)> {
    let mut out = Vec::new();
    for (i, root) in forest.iter().enumerate() {
        collect(root, NodePath::root(i), &mut out);
    }
    out
}

fn collect<'a>(node: &'a Individual, path: NodePath, out: &mut Vec<(NodePath, &'a Individual)>) {
    let children: Vec<NodePath> = (0..node.descendants().len()).map(|j| path.child(j)).collect();
    out.push((path, node));
    for (child_path, child) in children.into_iter().zip(node.descendants()) {
        collect(child, child_path, out);
    }
}

/// Pick a node uniformly among `root` and all of its descendants.
///
/// Returns the child-index steps from `root` to the chosen node (empty for
/// the root itself).
pub fn select_random_node<R: Rng + ?Sized>(root: &Individual, rng: &mut R) -> Vec<usize> {
    let mut target = rng.random_range(0..root.subtree_size());
    let mut steps = Vec::new();
    let mut current = root;

    'descend: while target > 0 {
        target -= 1;
        for (j, child) in current.descendants().iter().enumerate() {
            let size = child.subtree_size();
            if target < size {
                steps.push(j);
                current = child;
                continue 'descend;
            }
            target -= size;
        }
        break;
    }
    steps
}

/// Rebuild a tree keeping only the nodes in `keep`.
///
/// Surviving descendants of a dropped node move up to its nearest kept
/// ancestor, or become roots when no ancestor is kept. Returns the nodes
/// that take this node's place: the node itself when kept, otherwise its
/// lifted survivors (possibly none).
pub fn prune(mut node: Individual, path: &NodePath, keep: &HashSet<NodePath>) -> Vec<Individual> {
    let survivors: Vec<Individual> = node
        .take_descendants()
        .into_iter()
        .enumerate()
        .flat_map(|(j, child)| prune(child, &path.child(j), keep))
        .collect();

    if keep.contains(path) {
        *node.descendants_mut() = survivors;
        vec![node]
    } else {
        survivors
    }
}
