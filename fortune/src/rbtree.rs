//! An arena-backed red-black tree with in-order neighbor links.
//!
//! Both the beachline and the circle event queue are ordered sequences that
//! get edited next to nodes we already hold a handle to, so this tree never
//! compares values. Callers walk it themselves (using `left`, `right` and
//! friends) and insert new nodes directly after an existing one.
//!
//! Nodes live in a `Vec` and refer to one another by [`NodeIdx`]. Removed
//! slots are recycled, so a `NodeIdx` is only meaningful until its node is
//! removed.

/// A handle to a node in an [`RbTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(usize);

impl std::fmt::Debug for NodeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n_{}", self.0)
    }
}

#[derive(Clone, Copy, Debug)]
struct Node<T> {
    value: T,
    parent: Option<NodeIdx>,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
    prev: Option<NodeIdx>,
    next: Option<NodeIdx>,
    red: bool,
}

#[derive(Clone, Debug)]
pub struct RbTree<T> {
    nodes: Vec<Node<T>>,
    free: Vec<NodeIdx>,
    root: Option<NodeIdx>,
}

impl<T> Default for RbTree<T> {
    fn default() -> Self {
        RbTree {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }
}

impl<T: Copy> std::ops::Index<NodeIdx> for RbTree<T> {
    type Output = T;

    fn index(&self, index: NodeIdx) -> &T {
        &self.nodes[index.0].value
    }
}

impl<T: Copy> std::ops::IndexMut<NodeIdx> for RbTree<T> {
    fn index_mut(&mut self, index: NodeIdx) -> &mut T {
        &mut self.nodes[index.0].value
    }
}

impl<T: Copy> RbTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeIdx> {
        self.root
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn left(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.nodes[idx.0].left
    }

    pub fn right(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.nodes[idx.0].right
    }

    pub fn parent(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.nodes[idx.0].parent
    }

    /// The in-order predecessor.
    pub fn prev(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.nodes[idx.0].prev
    }

    /// The in-order successor.
    pub fn next(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.nodes[idx.0].next
    }

    /// The smallest node, if there is one.
    pub fn first(&self) -> Option<NodeIdx> {
        self.root.map(|r| self.leftmost(r))
    }

    /// Iterates over the nodes in order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        std::iter::successors(self.first(), |&idx| self.next(idx))
    }

    fn leftmost(&self, mut idx: NodeIdx) -> NodeIdx {
        while let Some(left) = self.left(idx) {
            idx = left;
        }
        idx
    }

    fn is_red(&self, idx: Option<NodeIdx>) -> bool {
        idx.is_some_and(|i| self.nodes[i.0].red)
    }

    fn set_red(&mut self, idx: NodeIdx, red: bool) {
        self.nodes[idx.0].red = red;
    }

    fn alloc(&mut self, value: T) -> NodeIdx {
        let node = Node {
            value,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
            red: true,
        };
        if let Some(idx) = self.free.pop() {
            self.nodes[idx.0] = node;
            idx
        } else {
            self.nodes.push(node);
            NodeIdx(self.nodes.len() - 1)
        }
    }

    /// Points whatever pointed at `old` (its parent, or the root) at `new`.
    fn replace_child(&mut self, parent: Option<NodeIdx>, old: NodeIdx, new: Option<NodeIdx>) {
        match parent {
            Some(p) if self.nodes[p.0].left == Some(old) => self.nodes[p.0].left = new,
            Some(p) => self.nodes[p.0].right = new,
            None => self.root = new,
        }
    }

    fn rotate_left(&mut self, p: NodeIdx) {
        let q = self.right(p).expect("rotating left needs a right child");
        let parent = self.parent(p);
        self.replace_child(parent, p, Some(q));
        self.nodes[q.0].parent = parent;
        self.nodes[p.0].parent = Some(q);
        let inner = self.left(q);
        self.nodes[p.0].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner.0].parent = Some(p);
        }
        self.nodes[q.0].left = Some(p);
    }

    fn rotate_right(&mut self, p: NodeIdx) {
        let q = self.left(p).expect("rotating right needs a left child");
        let parent = self.parent(p);
        self.replace_child(parent, p, Some(q));
        self.nodes[q.0].parent = parent;
        self.nodes[p.0].parent = Some(q);
        let inner = self.right(q);
        self.nodes[p.0].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner.0].parent = Some(p);
        }
        self.nodes[q.0].right = Some(p);
    }

    /// Inserts `value` immediately after `pred` in the in-order sequence, or at
    /// the very beginning if `pred` is `None`.
    pub fn insert_after(&mut self, pred: Option<NodeIdx>, value: T) -> NodeIdx {
        let new = self.alloc(value);

        let parent = if let Some(pred) = pred {
            let next = self.next(pred);
            self.nodes[new.0].prev = Some(pred);
            self.nodes[new.0].next = next;
            if let Some(next) = next {
                self.nodes[next.0].prev = Some(new);
            }
            self.nodes[pred.0].next = Some(new);

            // The new node goes either as the right child of `pred`, or as the
            // left child of the leftmost node in `pred`'s right subtree.
            if let Some(right) = self.right(pred) {
                let attach = self.leftmost(right);
                self.nodes[attach.0].left = Some(new);
                Some(attach)
            } else {
                self.nodes[pred.0].right = Some(new);
                Some(pred)
            }
        } else if let Some(first) = self.first() {
            self.nodes[new.0].next = Some(first);
            self.nodes[first.0].prev = Some(new);
            self.nodes[first.0].left = Some(new);
            Some(first)
        } else {
            self.root = Some(new);
            None
        };
        self.nodes[new.0].parent = parent;

        self.fix_insert(new);
        new
    }

    fn fix_insert(&mut self, mut node: NodeIdx) {
        while let Some(mut parent) = self.parent(node).filter(|&p| self.is_red(Some(p))) {
            // unwrap: a red node is never the root, so it has a parent.
            let grandpa = self.parent(parent).unwrap();
            if self.left(grandpa) == Some(parent) {
                let uncle = self.right(grandpa);
                if let Some(uncle) = uncle.filter(|&u| self.is_red(Some(u))) {
                    self.set_red(parent, false);
                    self.set_red(uncle, false);
                    self.set_red(grandpa, true);
                    node = grandpa;
                } else {
                    if self.right(parent) == Some(node) {
                        self.rotate_left(parent);
                        node = parent;
                        // unwrap: we just rotated something above it.
                        parent = self.parent(node).unwrap();
                    }
                    self.set_red(parent, false);
                    self.set_red(grandpa, true);
                    self.rotate_right(grandpa);
                }
            } else {
                let uncle = self.left(grandpa);
                if let Some(uncle) = uncle.filter(|&u| self.is_red(Some(u))) {
                    self.set_red(parent, false);
                    self.set_red(uncle, false);
                    self.set_red(grandpa, true);
                    node = grandpa;
                } else {
                    if self.left(parent) == Some(node) {
                        self.rotate_right(parent);
                        node = parent;
                        // unwrap: we just rotated something above it.
                        parent = self.parent(node).unwrap();
                    }
                    self.set_red(parent, false);
                    self.set_red(grandpa, true);
                    self.rotate_left(grandpa);
                }
            }
        }
        if let Some(root) = self.root {
            self.set_red(root, false);
        }
    }

    /// Removes a node from the tree, returning its value.
    ///
    /// `idx` must not be used again afterwards.
    pub fn remove(&mut self, idx: NodeIdx) -> T {
        let Node {
            value,
            parent,
            left,
            right,
            prev,
            next,
            red,
        } = self.nodes[idx.0];

        if let Some(next) = next {
            self.nodes[next.0].prev = prev;
        }
        if let Some(prev) = prev {
            self.nodes[prev.0].next = next;
        }

        let successor = match (left, right) {
            (None, _) => right,
            (_, None) => left,
            (Some(_), Some(right)) => Some(self.leftmost(right)),
        };
        self.replace_child(parent, idx, successor);

        // `node` is where the black deficit (if any) ends up, and `parent` is
        // its parent. `node` can be empty.
        let mut node;
        let mut parent = parent;
        let removed_red;
        if let (Some(left), Some(right), Some(succ)) = (left, right, successor) {
            removed_red = self.nodes[succ.0].red;
            self.nodes[succ.0].red = red;
            self.nodes[succ.0].left = Some(left);
            self.nodes[left.0].parent = Some(succ);
            if succ != right {
                let succ_parent = self.parent(succ);
                self.nodes[succ.0].parent = parent;
                node = self.right(succ);
                // unwrap: succ is the leftmost node below `right`, so it has a parent.
                let succ_parent = succ_parent.unwrap();
                self.nodes[succ_parent.0].left = node;
                self.nodes[succ.0].right = Some(right);
                self.nodes[right.0].parent = Some(succ);
                parent = Some(succ_parent);
            } else {
                self.nodes[succ.0].parent = parent;
                parent = Some(succ);
                node = self.right(succ);
            }
        } else {
            removed_red = red;
            node = successor;
        }
        if let Some(n) = node {
            self.nodes[n.0].parent = parent;
        }

        self.free.push(idx);

        if removed_red {
            return value;
        }
        if let Some(n) = node.filter(|&n| self.is_red(Some(n))) {
            self.set_red(n, false);
            return value;
        }

        loop {
            if node == self.root {
                break;
            }
            let p = parent.expect("a non-root node has a parent");
            if node == self.left(p) {
                let mut sibling = self.right(p).expect("a black deficit means a sibling");
                if self.is_red(Some(sibling)) {
                    self.set_red(sibling, false);
                    self.set_red(p, true);
                    self.rotate_left(p);
                    sibling = self.right(p).expect("a black deficit means a sibling");
                }
                let (sl, sr) = (self.left(sibling), self.right(sibling));
                if self.is_red(sl) || self.is_red(sr) {
                    if !self.is_red(sr) {
                        // unwrap: we just checked that one of the children is red.
                        self.set_red(sl.unwrap(), false);
                        self.set_red(sibling, true);
                        self.rotate_right(sibling);
                        sibling = self.right(p).expect("a black deficit means a sibling");
                    }
                    let parent_red = self.nodes[p.0].red;
                    self.set_red(sibling, parent_red);
                    self.set_red(p, false);
                    if let Some(sr) = self.right(sibling) {
                        self.set_red(sr, false);
                    }
                    self.rotate_left(p);
                    node = self.root;
                    break;
                }
                self.set_red(sibling, true);
            } else {
                let mut sibling = self.left(p).expect("a black deficit means a sibling");
                if self.is_red(Some(sibling)) {
                    self.set_red(sibling, false);
                    self.set_red(p, true);
                    self.rotate_right(p);
                    sibling = self.left(p).expect("a black deficit means a sibling");
                }
                let (sl, sr) = (self.left(sibling), self.right(sibling));
                if self.is_red(sl) || self.is_red(sr) {
                    if !self.is_red(sl) {
                        // unwrap: we just checked that one of the children is red.
                        self.set_red(sr.unwrap(), false);
                        self.set_red(sibling, true);
                        self.rotate_left(sibling);
                        sibling = self.left(p).expect("a black deficit means a sibling");
                    }
                    let parent_red = self.nodes[p.0].red;
                    self.set_red(sibling, parent_red);
                    self.set_red(p, false);
                    if let Some(sl) = self.left(sibling) {
                        self.set_red(sl, false);
                    }
                    self.rotate_right(p);
                    node = self.root;
                    break;
                }
                self.set_red(sibling, true);
            }
            node = Some(p);
            parent = self.parent(p);
            if self.is_red(node) {
                break;
            }
        }
        if let Some(n) = node {
            self.set_red(n, false);
        }

        value
    }

    /// Checks the tree's structural invariants, panicking if one is violated.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        fn black_height<T: Copy>(tree: &RbTree<T>, idx: Option<NodeIdx>) -> usize {
            let Some(idx) = idx else {
                return 1;
            };
            let node = &tree.nodes[idx.0];
            for child in [node.left, node.right].into_iter().flatten() {
                assert_eq!(tree.parent(child), Some(idx));
                assert!(!(node.red && tree.is_red(Some(child))), "red {idx:?} has a red child");
            }
            let l = black_height(tree, node.left);
            let r = black_height(tree, node.right);
            assert_eq!(l, r, "unbalanced at {idx:?}");
            l + usize::from(!node.red)
        }

        assert!(!self.is_red(self.root));
        if let Some(root) = self.root {
            assert_eq!(self.parent(root), None);
        }
        black_height(self, self.root);

        // The prev/next links agree with an in-order walk.
        fn in_order<T: Copy>(tree: &RbTree<T>, idx: Option<NodeIdx>, out: &mut Vec<NodeIdx>) {
            if let Some(idx) = idx {
                in_order(tree, tree.left(idx), out);
                out.push(idx);
                in_order(tree, tree.right(idx), out);
            }
        }
        let mut walked = Vec::new();
        in_order(self, self.root, &mut walked);
        let linked: Vec<_> = self.iter().collect();
        assert_eq!(walked, linked);
        for pair in linked.windows(2) {
            assert_eq!(self.prev(pair[1]), Some(pair[0]));
        }
        if let Some(first) = linked.first() {
            assert_eq!(self.prev(*first), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn values(tree: &RbTree<u32>) -> Vec<u32> {
        tree.iter().map(|idx| tree[idx]).collect()
    }

    #[test]
    fn insert_in_order() {
        let mut tree = RbTree::new();
        let mut last = None;
        for i in 0..20 {
            last = Some(tree.insert_after(last, i));
            tree.check_invariants();
        }
        assert_eq!(values(&tree), (0..20).collect::<Vec<_>>());

        // Inserting with no predecessor goes to the front.
        tree.insert_after(None, 100);
        tree.check_invariants();
        assert_eq!(values(&tree)[0], 100);
        assert_eq!(tree.len(), 21);
    }

    #[test]
    fn remove_and_reuse() {
        let mut tree = RbTree::new();
        let a = tree.insert_after(None, 1);
        let b = tree.insert_after(Some(a), 2);
        let c = tree.insert_after(Some(b), 3);
        assert_eq!(tree.remove(b), 2);
        tree.check_invariants();
        assert_eq!(tree.next(a), Some(c));
        assert_eq!(tree.prev(c), Some(a));

        // The freed slot gets recycled.
        let d = tree.insert_after(Some(c), 4);
        assert_eq!(d, b);
        assert_eq!(values(&tree), vec![1, 3, 4]);

        tree.remove(a);
        tree.remove(c);
        tree.remove(d);
        tree.check_invariants();
        assert!(tree.is_empty());
        assert_eq!(tree.first(), None);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(usize),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => any::<usize>().prop_map(Op::Insert),
            2 => any::<usize>().prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn behaves_like_a_vec(ops in prop::collection::vec(op(), 1..200)) {
            let mut tree = RbTree::new();
            let mut model: Vec<(NodeIdx, u32)> = Vec::new();

            for (counter, op) in ops.into_iter().enumerate() {
                let counter = counter as u32;
                match op {
                    Op::Insert(pos) => {
                        let pos = pos % (model.len() + 1);
                        let pred = pos.checked_sub(1).map(|p| model[p].0);
                        let idx = tree.insert_after(pred, counter);
                        model.insert(pos, (idx, counter));
                    }
                    Op::Remove(pos) => {
                        if !model.is_empty() {
                            let (idx, value) = model.remove(pos % model.len());
                            prop_assert_eq!(tree.remove(idx), value);
                        }
                    }
                }
                tree.check_invariants();
                let expected: Vec<_> = model.iter().map(|(_, v)| *v).collect();
                prop_assert_eq!(values(&tree), expected);
            }
        }
    }
}
