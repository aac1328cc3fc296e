//! Unbalanced binary search tree used as the ordered index of the ring.
//!
//! The tree never rebalances. Keys on the ring are hash digests, which
//! arrive in effectively random order, so the expected height stays
//! logarithmic; monotonic key sequences degrade every operation to O(n).
//! All walks are iterative so a degenerate tree costs time, not stack.

use std::cmp::Ordering;
use std::fmt;
use std::mem;

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Box<Self> {
        Box::new(Node {
            key,
            value,
            left: None,
            right: None,
        })
    }
}

pub struct SearchTree<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> SearchTree<K, V> {
    pub fn new() -> Self {
        SearchTree { root: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_spine(self.root.as_deref());
        iter
    }

    /// Entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        let mut current = self.root.as_deref()?;
        while let Some(left) = current.left.as_deref() {
            current = left;
        }
        Some((&current.key, &current.value))
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut level: Vec<&Node<K, V>> = self.root.as_deref().into_iter().collect();
        while !level.is_empty() {
            height += 1;
            level = level
                .into_iter()
                .flat_map(|node| node.left.as_deref().into_iter().chain(node.right.as_deref()))
                .collect();
        }
        height
    }
}

impl<K: Ord, V> SearchTree<K, V> {
    /// Inserts a new leaf, or replaces the value stored under an existing
    /// key without touching the tree shape. Returns the replaced value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let link = find_link(&mut self.root, &key);
        match link {
            Some(node) => Some(mem::replace(&mut node.value, value)),
            None => {
                *link = Some(Node::leaf(key, value));
                self.len += 1;
                None
            }
        }
    }

    /// Removes `key`, returning its value. Absent keys are a no-op.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let link = find_link(&mut self.root, key);
        let mut node = link.take()?;
        self.len -= 1;

        *link = match (node.left.take(), node.right.take()) {
            (None, None) => None,
            // a single child takes the removed node's place along with its subtrees
            (Some(child), None) | (None, Some(child)) => Some(child),
            (Some(left), Some(right)) => {
                let mut rest = Some(right);
                detach_min(&mut rest).map(|mut successor| {
                    successor.left = Some(left);
                    successor.right = rest;
                    successor
                })
            }
        };

        Some(node.value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match node.key.cmp(key) {
                Ordering::Greater => node.left.as_deref(),
                Ordering::Less => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Entry with the smallest key strictly greater than `key`.
    pub fn find_nearest_greater_than(&self, key: &K) -> Option<(&K, &V)> {
        let mut current = self.root.as_deref();
        let mut candidate: Option<&Node<K, V>> = None;

        while let Some(node) = current {
            if node.key > *key {
                candidate = Some(node);
                current = node.left.as_deref();
            } else {
                current = node.right.as_deref();
            }
        }

        candidate.map(|node| (&node.key, &node.value))
    }
}

impl<K: Clone, V: Clone> SearchTree<K, V> {
    /// Copies all entries out in ascending key order.
    pub fn to_ordered_vec(&self) -> Vec<(K, V)> {
        self.iter().map(|(key, value)| (key.clone(), value.clone())).collect()
    }
}

impl<K: fmt::Display, V> SearchTree<K, V> {
    /// Draws the tree as text: the left subtree sits on the rows below and
    /// to the left of a key, the right subtree below and to the right.
    ///
    /// ```
    /// use crustyring::SearchTree;
    ///
    /// let mut tree = SearchTree::new();
    /// tree.insert(4, ());
    /// tree.insert(2, ());
    /// tree.insert(7, ());
    /// assert_eq!(tree.render(), vec![" 4", "2 7"]);
    /// ```
    pub fn render(&self) -> Vec<String> {
        enum Step<'a, K, V> {
            Visit(&'a Node<K, V>),
            Join(&'a Node<K, V>),
        }

        let Some(root) = self.root.as_deref() else {
            return Vec::new();
        };

        // every block holds rows of equal width
        let mut blocks: Vec<Vec<String>> = Vec::new();
        let mut steps = vec![Step::Visit(root)];

        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(node) => {
                    steps.push(Step::Join(node));
                    if let Some(right) = node.right.as_deref() {
                        steps.push(Step::Visit(right));
                    }
                    if let Some(left) = node.left.as_deref() {
                        steps.push(Step::Visit(left));
                    }
                }
                Step::Join(node) => {
                    let right = match node.right {
                        Some(_) => blocks.pop().unwrap_or_default(),
                        None => Vec::new(),
                    };
                    let left = match node.left {
                        Some(_) => blocks.pop().unwrap_or_default(),
                        None => Vec::new(),
                    };
                    blocks.push(join_blocks(&node.key.to_string(), left, right));
                }
            }
        }

        blocks
            .pop()
            .unwrap_or_default()
            .into_iter()
            .map(|line| line.trim_end().to_owned())
            .collect()
    }
}

fn join_blocks(label: &str, left: Vec<String>, right: Vec<String>) -> Vec<String> {
    let left_space = " ".repeat(left.first().map_or(0, String::len));
    let right_space = " ".repeat(right.first().map_or(0, String::len));
    let mid_space = " ".repeat(label.len());

    let rows = left.len().max(right.len());
    let mut lines = Vec::with_capacity(rows + 1);
    lines.push(format!("{left_space}{label}{right_space}"));

    for i in 0..rows {
        let l = left.get(i).map_or(left_space.as_str(), String::as_str);
        let r = right.get(i).map_or(right_space.as_str(), String::as_str);
        lines.push(format!("{l}{mid_space}{r}"));
    }

    lines
}

/// Walks down to the link that holds `key`, or to the empty link where it
/// would be attached.
fn find_link<'a, K: Ord, V>(mut link: &'a mut Link<K, V>, key: &K) -> &'a mut Link<K, V> {
    loop {
        let ordering = link.as_ref().map(|node| node.key.cmp(key));
        link = match (ordering, link) {
            (Some(Ordering::Greater), Some(node)) => &mut node.left,
            (Some(Ordering::Less), Some(node)) => &mut node.right,
            (_, link) => return link,
        };
    }
}

/// Unlinks the leftmost node under `link`, splicing its right child into
/// the vacated slot.
fn detach_min<K, V>(mut link: &mut Link<K, V>) -> Link<K, V> {
    loop {
        let has_left = link.as_ref().is_some_and(|node| node.left.is_some());
        link = match (has_left, link) {
            (true, Some(node)) => &mut node.left,
            (_, link) => {
                let mut min = link.take()?;
                *link = min.right.take();
                return Some(min);
            }
        };
    }
}

impl<K, V> Default for SearchTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for SearchTree<K, V> {
    fn drop(&mut self) {
        let mut pending: Vec<Box<Node<K, V>>> = self.root.take().into_iter().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SearchTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// In-order iterator over a [`SearchTree`].
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left_spine(&mut self, mut current: Option<&'a Node<K, V>>) {
        while let Some(node) = current {
            self.stack.push(node);
            current = node.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some((&node.key, &node.value))
    }
}

impl<'a, K, V> IntoIterator for &'a SearchTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    /// Builds a tree by inserting the keys of a diagram row by row, which
    /// reproduces the drawn shape.
    fn from_diagram(lines: &[&str]) -> SearchTree<i64, String> {
        let mut tree = SearchTree::new();
        for line in lines {
            for token in line.split_whitespace() {
                let key: i64 = token.parse().expect("integer key");
                tree.insert(key, token.to_owned());
            }
        }
        tree
    }

    fn from_keys(keys: &[i64]) -> SearchTree<i64, ()> {
        let mut tree = SearchTree::new();
        for key in keys {
            tree.insert(*key, ());
        }
        tree
    }

    #[test]
    fn render_empty_tree() {
        let tree: SearchTree<u32, ()> = SearchTree::new();
        assert!(tree.render().is_empty());
    }

    #[test]
    fn render_single_node() {
        assert_eq!(from_keys(&[4]).render(), vec!["4"]);
    }

    #[test]
    fn render_three_nodes() {
        let tree = from_keys(&[4, 2, 7]);
        assert_eq!(tree.render(), vec![" 4", "2 7"]);
        let keys: Vec<i64> = tree.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![2, 4, 7]);
    }

    #[test]
    fn render_unbalanced_towards_left() {
        let tree = from_keys(&[1000, 900, 50, 1]);
        assert_eq!(tree.render(), vec!["      1000", "   900", " 50", "1"]);
    }

    #[test]
    fn render_unbalanced_left_with_single_right_nodes() {
        let tree = from_keys(&[1000, 900, 50, 1, 1001, 901, 51, 2]);
        assert_eq!(
            tree.render(),
            vec![
                "            1000",
                "      900       1001",
                "  50     901",
                "1   51",
                " 2",
            ]
        );
    }

    #[test]
    fn render_unbalanced_towards_right() {
        let tree = from_keys(&[1, 50, 900, 1000]);
        assert_eq!(tree.render(), vec!["1", " 50", "   900", "      1000"]);
    }

    #[test]
    fn render_unbalanced_right_with_single_left_nodes() {
        let tree = from_keys(&[1, 50, 900, 1000, -1, 49, 899, 999]);
        assert_eq!(
            tree.render(),
            vec![
                "  1",
                "-1   50",
                "   49     900",
                "       899      1000",
                "             999",
            ]
        );
    }

    #[test]
    fn render_big_tree() {
        let tree = from_keys(&[77, 342, 255, 80, 766, 333, 432, 350, 40, 55, 47, 15, 7, 12, 14]);
        assert_eq!(
            tree.render(),
            vec![
                "             77",
                "       40              342",
                "     15    55    255            766",
                "7        47    80   333      432",
                " 12                       350",
                "   14",
            ]
        );
    }

    #[test]
    fn diagram_helper_reproduces_shape() {
        let lines = ["   6", " 4       15", "3 5  10      20", "    9  11  18  22"];
        assert_eq!(from_diagram(&lines).render(), lines);
    }

    #[test]
    fn remove_from_empty_tree_does_nothing() {
        let mut tree: SearchTree<i64, ()> = SearchTree::new();
        assert_eq!(tree.remove(&42), None);
        assert!(tree.render().is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn remove_last_node() {
        let mut tree = SearchTree::new();
        tree.insert(42, "answer");
        assert_eq!(tree.remove(&42), Some("answer"));
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.render().is_empty());
    }

    #[test]
    fn remove_left_leaf() {
        let mut tree = from_diagram(&["   6", " 4       15", "3 5  10      20", "    9  11  18  22"]);
        tree.remove(&9);
        assert_eq!(
            tree.render(),
            vec!["   6", " 4      15", "3 5 10      20", "      11  18  22"]
        );
    }

    #[test]
    fn remove_right_leaf() {
        let mut tree = from_diagram(&["   6", " 4       15", "3 5  10      20", "    9  11  18  22"]);
        tree.remove(&5);
        assert_eq!(
            tree.render(),
            vec!["  6", " 4      15", "3   10      20", "   9  11  18  22"]
        );
    }

    #[test]
    fn remove_node_with_left_child_only() {
        let mut tree = from_diagram(&["   6", " 4     15", "3 5  10    20", "    9    18  22"]);
        tree.remove(&10);
        assert_eq!(
            tree.render(),
            vec!["   6", " 4   15", "3 5 9    20", "       18  22"]
        );
    }

    #[test]
    fn remove_node_with_right_child_only() {
        let mut tree = from_diagram(&["   6", " 4     15", "3 5  10  20", "    9      22"]);
        tree.remove(&20);
        assert_eq!(tree.render(), vec!["   6", " 4     15", "3 5  10  22", "    9"]);
    }

    #[test]
    fn remove_node_with_both_children_and_leaf_successor() {
        let mut tree = from_diagram(&["   6", " 4     15", "3 5  10  20", "    9      22"]);
        tree.remove(&4);
        assert_eq!(
            tree.render(),
            vec!["  6", " 5    15", "3   10  20", "   9      22"]
        );
    }

    #[test]
    fn remove_node_with_both_children_and_subtree_successor() {
        let mut tree = from_diagram(&["   6", " 4     15", "3 5  10    20", "    9    18  22"]);
        tree.remove(&15);
        assert_eq!(
            tree.render(),
            vec!["   6", " 4     18", "3 5  10  20", "    9      22"]
        );
    }

    #[test]
    fn remove_successor_keeps_its_right_subtree() {
        // successor 7 of the root has a right child 8 that must survive
        let mut tree = from_keys(&[5, 3, 10, 7, 8]);
        tree.remove(&5);
        let keys: Vec<i64> = tree.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![3, 7, 8, 10]);
        assert_eq!(tree.render(), vec![" 7", "3  10", "  8"]);
    }

    #[test]
    fn remove_root() {
        let mut tree = from_diagram(&["   6", " 4     15", "3 5  10    20", "    9    18  22"]);
        assert_eq!(tree.remove(&6), Some("6".to_owned()));
        assert_eq!(
            tree.render(),
            vec!["   9", " 4    15", "3 5 10    20", "        18  22"]
        );
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn to_ordered_vec_of_empty_tree() {
        let tree: SearchTree<u32, String> = SearchTree::new();
        assert!(tree.to_ordered_vec().is_empty());
    }

    #[test]
    fn to_ordered_vec_single_node() {
        let mut tree = SearchTree::new();
        tree.insert(1u32, "root".to_owned());
        assert_eq!(tree.to_ordered_vec(), vec![(1, "root".to_owned())]);
    }

    #[test]
    fn to_ordered_vec_is_ascending() {
        let mut tree = SearchTree::new();
        tree.insert(6u32, "root");
        tree.insert(3, "left");
        tree.insert(9, "right");
        assert_eq!(tree.to_ordered_vec(), vec![(3, "left"), (6, "root"), (9, "right")]);
    }

    fn assert_nearest(tree: &SearchTree<i64, String>) {
        let nearest = |x: i64| tree.find_nearest_greater_than(&x).map(|(_, v)| v.as_str());
        assert_eq!(nearest(0), Some("3"));
        assert_eq!(nearest(3), Some("4"));
        assert_eq!(nearest(5), Some("6"));
        assert_eq!(nearest(7), Some("8"));
        assert_eq!(nearest(8), Some("9"));
        assert_eq!(nearest(9), None);
        assert_eq!(nearest(10), None);
    }

    #[test]
    fn nearest_greater_in_balanced_tree() {
        assert_nearest(&from_diagram(&["  6", "3   9", " 4 8"]));
    }

    #[test]
    fn nearest_greater_in_left_leaning_tree() {
        assert_nearest(&from_diagram(&["    9", "   8", "  6", " 4", "3"]));
    }

    #[test]
    fn nearest_greater_in_right_leaning_tree() {
        assert_nearest(&from_diagram(&["3", " 4", "  6", "   8", "    9"]));
    }

    #[test]
    fn nearest_greater_in_empty_tree() {
        let tree: SearchTree<u32, ()> = SearchTree::new();
        assert!(tree.find_nearest_greater_than(&0).is_none());
        assert!(tree.first().is_none());
    }

    #[test]
    fn reinsert_replaces_value_and_keeps_shape() {
        let mut tree = from_diagram(&["   6", " 4     15", "3 5  10    20", "    9    18  22"]);
        let before = tree.render();

        assert_eq!(tree.insert(10, "ten".to_owned()), Some("10".to_owned()));

        assert_eq!(tree.render(), before);
        assert_eq!(tree.len(), 10);
        assert_eq!(tree.get(&10).map(String::as_str), Some("ten"));
    }

    #[test]
    fn insert_then_remove_leaves_empty_tree() {
        let mut tree = SearchTree::new();
        tree.insert(7u32, ());
        tree.remove(&7);
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn random_operations_match_btreeset() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let mut tree = SearchTree::new();
            let mut model = BTreeSet::new();

            for _ in 0..200 {
                let key: u32 = rng.gen_range(0..100);
                if rng.gen_bool(0.7) {
                    tree.insert(key, key);
                    model.insert(key);
                } else {
                    assert_eq!(tree.remove(&key).is_some(), model.remove(&key));
                }
            }

            let exported: Vec<u32> = tree.to_ordered_vec().into_iter().map(|(k, _)| k).collect();
            assert!(exported.windows(2).all(|pair| pair[0] < pair[1]));
            assert_eq!(exported, model.iter().copied().collect::<Vec<_>>());
            assert_eq!(tree.len(), model.len());

            for probe in 0..101u32 {
                let expected = model.range(probe + 1..).next();
                assert_eq!(tree.find_nearest_greater_than(&probe).map(|(k, _)| k), expected);
            }
            assert_eq!(tree.first().map(|(k, _)| k), model.iter().next());
        }
    }

    #[test]
    fn degenerate_tree_stays_off_the_call_stack() {
        let count = 10_000u32;
        let mut tree = SearchTree::new();
        for key in 0..count {
            tree.insert(key, ());
        }

        assert_eq!(tree.height(), count as usize);
        assert_eq!(tree.iter().count(), count as usize);
        assert_eq!(tree.find_nearest_greater_than(&(count - 2)).map(|(k, _)| *k), Some(count - 1));

        for key in (0..count).step_by(2) {
            tree.remove(&key);
        }
        assert_eq!(tree.len(), (count / 2) as usize);
        // dropped here
    }

    #[test]
    fn debug_lists_entries_in_order() {
        let tree = from_keys(&[2, 1]);
        assert_eq!(format!("{tree:?}"), "{1: (), 2: ()}");
    }
}
