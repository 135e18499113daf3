//! Bounded top-K link selection.
//!
//! A binary tree keyed by weight, stored in an arena. Strictly larger
//! weights go left, smaller or equal weights go right, so an in-order walk
//! (left, node, right) yields descending weights with ties in insertion
//! order.
//!
//! Every node knows the size of its subtree. Once the root's left subtree
//! holds more than `min_rank + count` nodes, the root and everything to its
//! right can never reach the requested page: the tree is cut down to that
//! left subtree and the discarded slots are recycled.
//!
//! Whatever the insertion order, the tree never holds more than
//! `min_rank + count` nodes: past that, the in-order last node (lightest,
//! latest among ties) is dropped. Ranks only grow as links are inserted, so
//! a dropped link could never have come back into the page.
//!
//! No rebalancing is done. Insertion cost is the depth of the tree, which
//! is at most `min_rank + count`.

use crate::model::{Link, ResultWindow};
use super::LinkScoreMap;

struct SelectorNode {
    link: String,
    weight: f64,
    left: Option<usize>,
    right: Option<usize>,
    /// Nodes in this subtree, including this one.
    count: usize,
}

/// Size-bounded weighted tree answering one result window.
pub struct BoundedTopK {
    nodes: Vec<SelectorNode>,
    free: Vec<usize>,
    root: Option<usize>,
    window: ResultWindow,
}

impl BoundedTopK {
    pub fn new(window: ResultWindow) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            window,
        }
    }

    pub fn window(&self) -> ResultWindow {
        self.window
    }

    /// Number of links currently held.
    pub fn len(&self) -> usize {
        self.root.map_or(0, |r| self.nodes[r].count)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert a link. NaN weights have no place in the order and are ignored.
    pub fn insert(&mut self, link: impl Into<String>, weight: f64) {
        if weight.is_nan() {
            return;
        }
        let node = self.alloc(link.into(), weight);
        self.root = Some(match self.root {
            None => node,
            Some(root) => self.attach(root, node),
        });
        self.prune();
        self.trim_tail();
    }

    /// Links in `[min_rank, min_rank + count)`, heaviest first.
    pub fn links(&self) -> Vec<Link> {
        let ResultWindow { min_rank, count } = self.window;
        let end = self.window.end();
        let mut out = Vec::with_capacity(count.min(self.len().saturating_sub(min_rank)));

        let mut stack = Vec::new();
        let mut cursor = self.root;
        let mut rank = 0;
        while rank < end {
            while let Some(i) = cursor {
                stack.push(i);
                cursor = self.nodes[i].left;
            }
            let Some(i) = stack.pop() else {
                break;
            };
            let node = &self.nodes[i];
            if rank >= min_rank {
                out.push(Link::new(node.link.clone(), node.weight));
            }
            rank += 1;
            cursor = node.right;
        }
        out
    }

    fn alloc(&mut self, link: String, weight: f64) -> usize {
        let node = SelectorNode {
            link,
            weight,
            left: None,
            right: None,
            count: 1,
        };
        match self.free.pop() {
            Some(i) => {
                self.nodes[i] = node;
                i
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Settle `node` below `root`, counting it in every subtree it passes.
    /// Returns the index to store in the parent's slot.
    fn attach(&mut self, root: usize, node: usize) -> usize {
        let weight = self.nodes[node].weight;
        let mut at = root;
        loop {
            let current = &mut self.nodes[at];
            current.count += 1;
            let slot = if weight <= current.weight {
                &mut current.right
            } else {
                &mut current.left
            };
            match *slot {
                Some(next) => at = next,
                None => {
                    *slot = Some(node);
                    return root;
                }
            }
        }
    }

    fn prune(&mut self) {
        let limit = self.window.end();
        while let Some(root) = self.root {
            let Some(left) = self.nodes[root].left else {
                break;
            };
            if self.nodes[left].count <= limit {
                break;
            }
            self.nodes[root].left = None;
            self.release(root);
            self.root = Some(left);
        }
    }

    /// Drop in-order last nodes until the tree fits the window.
    fn trim_tail(&mut self) {
        let limit = self.window.end();
        while self.len() > limit {
            let Some(root) = self.root else {
                break;
            };
            let mut parent = None;
            let mut at = root;
            while let Some(next) = self.nodes[at].right {
                self.nodes[at].count -= 1;
                parent = Some(at);
                at = next;
            }
            let orphan = self.nodes[at].left.take();
            match parent {
                Some(p) => self.nodes[p].right = orphan,
                None => self.root = orphan,
            }
            self.release(at);
        }
    }

    /// Return `top` and its whole subtree to the free list.
    fn release(&mut self, top: usize) {
        let mut pending = vec![top];
        while let Some(i) = pending.pop() {
            let node = &mut self.nodes[i];
            pending.extend(node.left.take());
            pending.extend(node.right.take());
            node.link = String::new();
            self.free.push(i);
        }
    }

    #[cfg(test)]
    fn arena_in_use(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    #[cfg(test)]
    fn check_counts(&self) {
        fn count(tree: &BoundedTopK, at: Option<usize>) -> usize {
            let Some(i) = at else { return 0 };
            let node = &tree.nodes[i];
            let expected = 1 + count(tree, node.left) + count(tree, node.right);
            assert_eq!(node.count, expected, "subtree count of {}", node.link);
            expected
        }
        count(self, self.root);
    }
}

/// Page `[min_rank, min_rank + count)` of `scores`, heaviest first.
///
/// Equal scores keep the map's iteration order.
pub fn select_top_links(scores: &LinkScoreMap, min_rank: usize, count: usize) -> Vec<Link> {
    let window = ResultWindow::new(min_rank, count);
    if scores.is_empty() || window.is_empty() {
        return Vec::new();
    }
    let mut tree = BoundedTopK::new(window);
    for link in scores.iter() {
        tree.insert(link.id.as_str(), link.weight);
    }
    tree.links()
}
