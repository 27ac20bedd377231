//! K-d tree for nearest-neighbour queries over fixed-size keys
//!
//! Built once by recursive median partitioning (quickselect, so each level is
//! linear on average) and never mutated afterwards. Nodes live in an arena and
//! refer to their children by index, which keeps the tree trivially
//! serializable and `Sync`.
//!
//! Time complexity:
//! - Build: O(n log n) average
//! - Nearest neighbour: O(log n) average, O(n) worst case

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A point with `DIMENSIONS` numeric coordinates
pub trait KdPoint: Copy {
    const DIMENSIONS: usize;

    /// Coordinate along `axis` (0-based, < DIMENSIONS)
    fn axis_value(&self, axis: usize) -> f32;

    /// Euclidean distance over all dimensions
    fn distance(&self, other: &Self) -> f32 {
        (0..Self::DIMENSIONS)
            .map(|axis| {
                let d = self.axis_value(axis) - other.axis_value(axis);
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }
}

impl KdPoint for Vec2 {
    const DIMENSIONS: usize = 2;

    #[inline]
    fn axis_value(&self, axis: usize) -> f32 {
        self[axis]
    }
}

impl KdPoint for Vec3 {
    const DIMENSIONS: usize = 3;

    #[inline]
    fn axis_value(&self, axis: usize) -> f32 {
        self[axis]
    }
}

impl KdPoint for Vec4 {
    const DIMENSIONS: usize = 4;

    #[inline]
    fn axis_value(&self, axis: usize) -> f32 {
        self[axis]
    }
}

impl<const N: usize> KdPoint for [f32; N] {
    const DIMENSIONS: usize = N;

    #[inline]
    fn axis_value(&self, axis: usize) -> f32 {
        self[axis]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KdNode<P, V> {
    point: P,
    value: V,
    left: Option<usize>,
    right: Option<usize>,
}

/// Static k-d tree mapping points to payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdTree<P, V> {
    nodes: Vec<KdNode<P, V>>,
    root: Option<usize>,
}

impl<P, V> Default for KdTree<P, V> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }
}

impl<P: KdPoint, V> KdTree<P, V> {
    /// Build a tree from (point, payload) pairs
    pub fn build(items: Vec<(P, V)>) -> Self {
        let mut nodes = Vec::with_capacity(items.len());
        let root = build_recursive(items, 0, &mut nodes);
        Self { nodes, root }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// All stored (point, payload) pairs, in arena order
    pub fn iter(&self) -> impl Iterator<Item = (&P, &V)> {
        self.nodes.iter().map(|n| (&n.point, &n.value))
    }

    /// Nearest stored point to `target`. `None` only if the tree is empty.
    pub fn find_nearest(&self, target: &P) -> Option<(&P, &V)> {
        self.find_nearest_with_distance(target)
            .map(|(point, value, _)| (point, value))
    }

    /// Nearest stored point to `target` together with its distance
    pub fn find_nearest_with_distance(&self, target: &P) -> Option<(&P, &V, f32)> {
        let root = self.root?;
        let mut best = Best {
            index: root,
            distance: target.distance(&self.nodes[root].point),
        };
        self.search(Some(root), target, 0, &mut best);

        let node = &self.nodes[best.index];
        Some((&node.point, &node.value, best.distance))
    }

    fn search(&self, node: Option<usize>, target: &P, depth: usize, best: &mut Best) {
        let Some(index) = node else {
            return;
        };
        let node = &self.nodes[index];

        let distance = target.distance(&node.point);
        if distance < best.distance {
            *best = Best { index, distance };
        }

        let axis = depth % P::DIMENSIONS;
        let split = target.axis_value(axis) - node.point.axis_value(axis);
        let (near, far) = if split < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        self.search(near, target, depth + 1, best);

        // The far half-space can only help if the splitting plane is closer
        // than the best match so far
        if split.abs() < best.distance {
            self.search(far, target, depth + 1, best);
        }
    }

    /// Check that every node satisfies the split invariant (left <= node <= right)
    #[cfg(test)]
    fn is_valid(&self) -> bool {
        fn collect<P: KdPoint, V>(tree: &KdTree<P, V>, node: Option<usize>, out: &mut Vec<P>) {
            if let Some(i) = node {
                out.push(tree.nodes[i].point);
                collect(tree, tree.nodes[i].left, out);
                collect(tree, tree.nodes[i].right, out);
            }
        }

        fn check<P: KdPoint, V>(tree: &KdTree<P, V>, node: Option<usize>, depth: usize) -> bool {
            let Some(i) = node else {
                return true;
            };
            let n = &tree.nodes[i];
            let axis = depth % P::DIMENSIONS;
            let split = n.point.axis_value(axis);

            let mut left = Vec::new();
            let mut right = Vec::new();
            collect(tree, n.left, &mut left);
            collect(tree, n.right, &mut right);

            left.iter().all(|p| p.axis_value(axis) <= split)
                && right.iter().all(|p| p.axis_value(axis) >= split)
                && check(tree, n.left, depth + 1)
                && check(tree, n.right, depth + 1)
        }

        check(self, self.root, 0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Best {
    index: usize,
    distance: f32,
}

fn build_recursive<P: KdPoint, V>(
    mut items: Vec<(P, V)>,
    depth: usize,
    nodes: &mut Vec<KdNode<P, V>>,
) -> Option<usize> {
    if items.is_empty() {
        return None;
    }

    let axis = depth % P::DIMENSIONS;
    let median = items.len() / 2;
    let last = items.len() - 1;
    quickselect(&mut items, 0, last, median, axis);

    let right = items.split_off(median + 1);
    let (point, value) = items.pop()?;
    let left = items;

    let index = nodes.len();
    nodes.push(KdNode {
        point,
        value,
        left: None,
        right: None,
    });

    let left = build_recursive(left, depth + 1, nodes);
    let right = build_recursive(right, depth + 1, nodes);
    nodes[index].left = left;
    nodes[index].right = right;

    Some(index)
}

/// Move the k-th smallest item (along `axis`) into position `k`, with no
/// larger item before it and no smaller item after it. Items equal to the
/// k-th may end up on either side.
fn quickselect<P: KdPoint, V>(
    items: &mut [(P, V)],
    mut left: usize,
    mut right: usize,
    k: usize,
    axis: usize,
) {
    while left < right {
        let pivot = partition(items, left, right, axis);
        if pivot == k {
            return;
        } else if k < pivot {
            right = pivot - 1;
        } else {
            left = pivot + 1;
        }
    }
}

/// Lomuto partition around the last element of `items[left..=right]`
fn partition<P: KdPoint, V>(items: &mut [(P, V)], left: usize, right: usize, axis: usize) -> usize {
    let pivot_value = items[right].0.axis_value(axis);
    let mut store = left;

    for i in left..right {
        if items[i].0.axis_value(axis) < pivot_value {
            items.swap(i, store);
            store += 1;
        }
    }

    items.swap(store, right);
    store
}
