#![warn(missing_docs)]

//! Bounding volume hierarchy for scene hit-testing in myoviz.
//!
//! A binary tree over axis-aligned bounding boxes (one leaf per scene
//! decoration), stored as a flat index-based array for cache-friendly
//! traversal. The tree is rebuilt from scratch whenever the decoration list
//! changes; decorations are regenerated every frame anyway, so incremental
//! maintenance would buy nothing.
//!
//! Construction partitions items at the median of their box centers along
//! the current set's longest bounding-box dimension, yielding a balanced
//! tree in O(n log n).

use myoviz_math::{Aabb, Point3, Ray};

/// What a node holds: two children, or one originating item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvhNodeKind {
    /// Internal node with child node indices into the flat node array.
    Internal {
        /// Index of the left child node.
        left: usize,
        /// Index of the right child node.
        right: usize,
    },
    /// Leaf node referencing the item (decoration index) it was built from.
    Leaf {
        /// Index of the originating item.
        item: usize,
    },
}

/// One node in the flattened tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    /// Exact union of the node's content: both children's boxes for an
    /// internal node, the item's box for a leaf.
    pub aabb: Aabb,
    /// Children or item reference.
    pub kind: BvhNodeKind,
}

/// A ray hit against the hierarchy's contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhHit {
    /// Index of the hit item (as passed to [`Bvh::from_aabbs`]).
    pub item: usize,
    /// Ray parameter of the hit; the closest hit has the smallest `t`.
    pub t: f32,
}

/// An index-based bounding volume hierarchy.
///
/// The empty hierarchy (no nodes) is a valid state meaning "no scene
/// content"; every query on it reports a miss. When nonempty, the root is
/// node 0 and its box bounds the entire scene.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
}

impl Bvh {
    /// Build a hierarchy over `aabbs`, one leaf per input box. Leaf `item`
    /// indices refer back to positions in the input slice.
    pub fn from_aabbs(aabbs: &[Aabb]) -> Self {
        let mut items: Vec<(usize, Aabb, Point3)> = aabbs
            .iter()
            .enumerate()
            .map(|(i, aabb)| (i, *aabb, aabb.center()))
            .collect();

        let mut nodes = Vec::with_capacity(2 * aabbs.len());
        if !items.is_empty() {
            build_node(&mut nodes, &mut items);
        }
        Self { nodes }
    }

    /// The flattened node array (root first). Exposed for renderer upload
    /// and structural checks.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Whether the hierarchy holds any content.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The box bounding the whole scene, or `None` when empty.
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| n.aabb)
    }

    /// Nearest item whose bounding box the ray hits, by ray parameter.
    pub fn closest_aabb_hit(&self, ray: &Ray) -> Option<BvhHit> {
        self.closest_hit(ray, |_, leaf_aabb| {
            ray.intersect_aabb(leaf_aabb).map(|(t_enter, _)| t_enter)
        })
    }

    /// Nearest item by ray parameter, refined per leaf.
    ///
    /// Traversal prunes subtrees whose box the ray misses (or enters beyond
    /// the best hit so far) and descends into the nearer child first.
    /// `refine` receives the leaf's item index and box once the box itself
    /// is hit, and returns the item's exact hit parameter, or `None` to
    /// reject it — e.g. a ray/triangle test against the item's mesh.
    pub fn closest_hit<F>(&self, ray: &Ray, mut refine: F) -> Option<BvhHit>
    where
        F: FnMut(usize, &Aabb) -> Option<f32>,
    {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best: Option<BvhHit> = None;
        self.hit_node(0, ray, &mut best, &mut refine);
        best
    }

    fn hit_node<F>(&self, node: usize, ray: &Ray, best: &mut Option<BvhHit>, refine: &mut F)
    where
        F: FnMut(usize, &Aabb) -> Option<f32>,
    {
        let BvhNode { aabb, kind } = self.nodes[node];

        let Some((t_enter, _)) = ray.intersect_aabb(&aabb) else {
            return;
        };
        if best.is_some_and(|b| t_enter >= b.t) {
            return;
        }

        match kind {
            BvhNodeKind::Leaf { item } => {
                if let Some(t) = refine(item, &aabb) {
                    if best.map_or(true, |b| t < b.t) {
                        *best = Some(BvhHit { item, t });
                    }
                }
            }
            BvhNodeKind::Internal { left, right } => {
                let left_t = ray.intersect_aabb(&self.nodes[left].aabb).map(|(t, _)| t);
                let right_t = ray.intersect_aabb(&self.nodes[right].aabb).map(|(t, _)| t);

                match (left_t, right_t) {
                    (Some(lt), Some(rt)) => {
                        let (near, far) = if lt <= rt { (left, right) } else { (right, left) };
                        self.hit_node(near, ray, best, refine);
                        self.hit_node(far, ray, best, refine);
                    }
                    (Some(_), None) => self.hit_node(left, ray, best, refine),
                    (None, Some(_)) => self.hit_node(right, ray, best, refine),
                    (None, None) => {}
                }
            }
        }
    }
}

/// Recursively build a node over `items`, returning its index.
fn build_node(nodes: &mut Vec<BvhNode>, items: &mut [(usize, Aabb, Point3)]) -> usize {
    if let [(item, aabb, _)] = items {
        let idx = nodes.len();
        nodes.push(BvhNode {
            aabb: *aabb,
            kind: BvhNodeKind::Leaf { item: *item },
        });
        return idx;
    }

    // split at the median center along the longest dimension of the set's bounds
    let mut bounds = items[0].1;
    for (_, aabb, _) in items.iter().skip(1) {
        bounds = bounds.union(aabb);
    }
    let axis = bounds.longest_axis();

    let mid = items.len() / 2;
    items.select_nth_unstable_by(mid, |a, b| a.2[axis].total_cmp(&b.2[axis]));
    let (left_items, right_items) = items.split_at_mut(mid);

    // reserve the parent slot so the root lands at index 0
    let idx = nodes.len();
    nodes.push(BvhNode {
        aabb: bounds,
        kind: BvhNodeKind::Leaf { item: usize::MAX },
    });

    let left = build_node(nodes, left_items);
    let right = build_node(nodes, right_items);

    nodes[idx].aabb = nodes[left].aabb.union(&nodes[right].aabb);
    nodes[idx].kind = BvhNodeKind::Internal { left, right };
    idx
}
