use crate::core::types::Aabb;
use glam::IVec2;

/// Handle to a leaf of an [`AabbTree`]. Stays valid across updates until the
/// leaf is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Node<T> {
    aabb: Aabb,
    parent: Option<usize>,
    children: Option<[usize; 2]>,
    data: Option<T>,
}

impl<T> Node<T> {
    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Dynamic bounding-volume tree used as the broad-phase.
///
/// Leaves store a "fat" box: the tight box grown by a margin and stretched
/// along the expected motion. Moving a leaf inside its fat box is free.
#[derive(Debug)]
pub struct AabbTree<T> {
    nodes: Vec<Node<T>>,
    free_list: Vec<usize>,
    root: Option<usize>,
    margin: i32,
    leaf_count: usize,
}

impl<T> AabbTree<T> {
    pub fn new(margin: i32) -> Self {
        Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: None,
            margin,
            leaf_count: 0,
        }
    }

    pub fn margin(&self) -> i32 {
        self.margin
    }

    pub fn len(&self) -> usize {
        self.leaf_count
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    fn alloc(&mut self, aabb: Aabb, data: Option<T>) -> usize {
        let node = Node {
            aabb,
            parent: None,
            children: None,
            data,
        };
        if let Some(index) = self.free_list.pop() {
            self.nodes[index] = node;
            index
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn free(&mut self, index: usize) -> Option<T> {
        let node = &mut self.nodes[index];
        node.parent = None;
        node.children = None;
        self.free_list.push(index);
        node.data.take()
    }

    fn leaf(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes
            .get(id.index())
            .filter(|node| node.is_leaf() && node.data.is_some())
    }

    pub fn insert(&mut self, tight: Aabb, data: T) -> NodeId {
        let fat = tight.expand(self.margin);
        let index = self.alloc(fat, Some(data));
        self.insert_leaf(index);
        self.leaf_count += 1;
        NodeId(index as u32)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        self.leaf(id)?;
        self.remove_leaf(id.index());
        self.leaf_count -= 1;
        self.free(id.index())
    }

    /// Refits a leaf after its object moved. Nothing happens while `tight`
    /// stays inside the current fat box; otherwise the fat box is rebuilt and
    /// stretched by `move_hint`. Returns whether the tree changed.
    pub fn update(&mut self, id: NodeId, tight: Aabb, move_hint: IVec2) -> bool {
        let Some(leaf) = self.leaf(id) else {
            return false;
        };
        if leaf.aabb.contains(&tight) {
            return false;
        }

        self.remove_leaf(id.index());
        self.nodes[id.index()].aabb = tight.expand(self.margin).extend_toward(move_hint);
        self.insert_leaf(id.index());
        true
    }

    pub fn node_data(&self, id: NodeId) -> Option<&T> {
        self.leaf(id).and_then(|node| node.data.as_ref())
    }

    pub fn fat_aabb(&self, id: NodeId) -> Option<Aabb> {
        self.leaf(id).map(|node| node.aabb)
    }

    /// Visits every leaf whose fat box overlaps `aabb`. The visitor returns
    /// `true` to stop early, and so does this function.
    pub fn collide_aabb(&self, aabb: &Aabb, mut visit: impl FnMut(NodeId, &T) -> bool) -> bool {
        self.query(|node| node.overlaps(aabb), &mut visit)
    }

    /// Visits every leaf whose fat box contains `point`.
    pub fn collide_point(&self, point: IVec2, mut visit: impl FnMut(NodeId, &T) -> bool) -> bool {
        self.query(|node| node.contains_point(point), &mut visit)
    }

    fn query(
        &self,
        hit: impl Fn(&Aabb) -> bool,
        visit: &mut impl FnMut(NodeId, &T) -> bool,
    ) -> bool {
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !hit(&node.aabb) {
                continue;
            }
            match (node.children, &node.data) {
                (Some([a, b]), _) => {
                    stack.push(b);
                    stack.push(a);
                }
                (None, Some(data)) => {
                    if visit(NodeId(index as u32), data) {
                        return true;
                    }
                }
                (None, None) => {}
            }
        }
        false
    }

    fn insert_leaf(&mut self, leaf: usize) {
        let Some(root) = self.root else {
            self.root = Some(leaf);
            self.nodes[leaf].parent = None;
            return;
        };

        let leaf_aabb = self.nodes[leaf].aabb;
        let mut index = root;
        while let Some([a, b]) = self.nodes[index].children {
            let area = self.nodes[index].aabb.cost();
            let combined = self.nodes[index].aabb.union(&leaf_aabb).cost();
            // Pairing with this whole subtree.
            let cost = 2 * combined;
            // Any descent enlarges this node anyway.
            let inheritance = 2 * (combined - area);

            let child_cost = |child: usize| {
                let node = &self.nodes[child];
                let grown = node.aabb.union(&leaf_aabb).cost();
                if node.is_leaf() {
                    grown + inheritance
                } else {
                    grown - node.aabb.cost() + inheritance
                }
            };
            let (cost_a, cost_b) = (child_cost(a), child_cost(b));

            if cost < cost_a && cost < cost_b {
                break;
            }
            index = if cost_a <= cost_b { a } else { b };
        }

        let sibling = index;
        let old_parent = self.nodes[sibling].parent;
        let union = self.nodes[sibling].aabb.union(&leaf_aabb);
        let parent = self.alloc(union, None);
        self.nodes[parent].parent = old_parent;
        self.nodes[parent].children = Some([sibling, leaf]);
        self.nodes[sibling].parent = Some(parent);
        self.nodes[leaf].parent = Some(parent);

        match old_parent {
            Some(grand) => self.replace_child(grand, sibling, parent),
            None => self.root = Some(parent),
        }
        self.refit_from(old_parent);
    }

    fn remove_leaf(&mut self, leaf: usize) {
        if self.root == Some(leaf) {
            self.root = None;
            return;
        }
        let Some(parent) = self.nodes[leaf].parent else {
            return;
        };
        let Some([a, b]) = self.nodes[parent].children else {
            return;
        };
        let sibling = if a == leaf { b } else { a };
        let grand = self.nodes[parent].parent;

        self.nodes[sibling].parent = grand;
        match grand {
            Some(grand) => self.replace_child(grand, parent, sibling),
            None => self.root = Some(sibling),
        }
        self.free(parent);
        self.nodes[leaf].parent = None;
        self.refit_from(grand);
    }

    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if let Some(children) = self.nodes[parent].children.as_mut() {
            for child in children.iter_mut() {
                if *child == old {
                    *child = new;
                }
            }
        }
    }

    fn refit_from(&mut self, mut index: Option<usize>) {
        while let Some(i) = index {
            if let Some([a, b]) = self.nodes[i].children {
                self.nodes[i].aabb = self.nodes[a].aabb.union(&self.nodes[b].aabb);
            }
            index = self.nodes[i].parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: i32, y: i32, w: i32) -> Aabb {
        Aabb::from_corners(IVec2::new(x, y), IVec2::new(x + w, y + w))
    }

    fn check_structure<T>(tree: &AabbTree<T>) {
        let mut leaves = 0;
        let mut stack: Vec<usize> = tree.root.into_iter().collect();
        while let Some(i) = stack.pop() {
            let node = &tree.nodes[i];
            match node.children {
                Some([a, b]) => {
                    for c in [a, b] {
                        assert_eq!(tree.nodes[c].parent, Some(i));
                        assert!(node.aabb.contains(&tree.nodes[c].aabb));
                        stack.push(c);
                    }
                }
                None => leaves += 1,
            }
        }
        assert_eq!(leaves, tree.len());
    }

    #[test]
    fn insert_query_remove() {
        let mut tree = AabbTree::new(2);
        let ids: Vec<_> = (0..20).map(|i| tree.insert(boxed(i * 30, 0, 10), i)).collect();
        check_structure(&tree);

        let mut hits = Vec::new();
        tree.collide_aabb(&boxed(55, 0, 10), |_, &v| {
            hits.push(v);
            false
        });
        hits.sort();
        assert_eq!(hits, vec![2]);

        for id in ids.iter().step_by(2) {
            assert!(tree.remove(*id).is_some());
        }
        assert!(tree.remove(ids[0]).is_none());
        assert_eq!(tree.len(), 10);
        check_structure(&tree);
    }

    #[test]
    fn update_inside_fat_box_is_noop() {
        let mut tree = AabbTree::new(4);
        let id = tree.insert(boxed(0, 0, 10), ());
        assert!(!tree.update(id, boxed(3, -2, 10), IVec2::ZERO));
        assert!(tree.update(id, boxed(5, 0, 10), IVec2::new(3, 0)));
        let fat = tree.fat_aabb(id).unwrap();
        assert_eq!(fat.min, IVec2::new(1, -4));
        assert_eq!(fat.max, IVec2::new(22, 14));
        check_structure(&tree);
    }

    #[test]
    fn visitor_can_stop_early() {
        let mut tree = AabbTree::new(0);
        for i in 0..5 {
            tree.insert(boxed(0, 0, 10), i);
        }
        let mut seen = 0;
        assert!(tree.collide_point(IVec2::new(5, 5), |_, _| {
            seen += 1;
            true
        }));
        assert_eq!(seen, 1);
    }
}
