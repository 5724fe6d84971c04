use crate::types::{PriceKey, StockId};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    key: PriceKey,
    left: Link,
    right: Link,
    height: u32,
}

impl Node {
    fn leaf(key: PriceKey) -> Self {
        Node {
            key,
            left: None,
            right: None,
            height: 1,
        }
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> i64 {
        i64::from(height(&self.left)) - i64::from(height(&self.right))
    }
}

fn height(link: &Link) -> u32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn balance_factor(link: &Link) -> i64 {
    link.as_ref().map_or(0, |node| node.balance_factor())
}

/// A self-balancing (AVL) binary search tree mapping prices to stock identifiers.
///
/// Nodes are keyed by `(price, id)`, so any number of stocks may share a price
/// and each of them can still be removed individually in $O(\log{N})$.
/// After every insert or remove, heights are recomputed on the way back up and
/// the balance factor of every node is restored to $\{-1, 0, 1\}$.
///
/// ### Thread Safety
///
/// The index has no interior locking. It lives inside a `StockTracker`, which
/// is meant to be wrapped in a `RwLock` as a whole.
#[derive(Debug, Default)]
pub struct PriceIndex {
    root: Link,
    len: usize,
}

impl PriceIndex {
    /// Creates a new empty price index.
    pub fn new() -> Self {
        PriceIndex { root: None, len: 0 }
    }

    /// Inserts `id` under `price`.
    ///
    /// The operation is $O(\log{N})$ where $N$ is the number of indexed stocks.
    ///
    /// ## Returns
    ///
    /// `false` if the exact `(price, id)` pair was already indexed
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::PriceIndex;
    ///
    /// let mut index = PriceIndex::new();
    /// assert!(index.insert(10.50, 7));
    /// assert!(!index.insert(10.50, 7));
    /// assert_eq!(index.len(), 1);
    /// ```
    pub fn insert(&mut self, price: f64, id: StockId) -> bool {
        let (root, inserted) = insert_node(self.root.take(), PriceKey::new(price, id));
        self.root = Some(root);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Removes the node of `id` indexed under `price`.
    ///
    /// Other stocks at the same price are left untouched.
    ///
    /// ## Returns
    ///
    /// `true` if a node was removed
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::PriceIndex;
    ///
    /// let mut index = PriceIndex::new();
    /// let price = 20.0;
    /// index.insert(price, 1);
    /// index.insert(price, 2);
    ///
    /// assert!(index.remove(price, 1));
    /// assert_eq!(index.range(price, price), vec![2]);
    /// ```
    pub fn remove(&mut self, price: f64, id: StockId) -> bool {
        let (root, removed) = remove_node(self.root.take(), &PriceKey::new(price, id));
        self.root = root;
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Returns whether `id` is indexed under `price`.
    pub fn contains(&self, price: f64, id: StockId) -> bool {
        let key = PriceKey::new(price, id);
        let mut current = &self.root;
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Less => &node.left,
                Ordering::Greater => &node.right,
                Ordering::Equal => return true,
            };
        }
        false
    }

    /// Collects the identifiers of every stock priced within `[low, high]`.
    ///
    /// The traversal is in-order and skips subtrees that cannot intersect the
    /// range, which makes it $O(\log{N} + K)$ where $K$ is the number of
    /// identifiers reported. Results are sorted by price, then by identifier.
    /// An inverted range yields nothing.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stock_tracker::PriceIndex;
    ///
    /// let mut index = PriceIndex::new();
    /// index.insert(30.0, 3);
    /// index.insert(10.0, 1);
    /// index.insert(20.0, 2);
    /// index.insert(0.1 + 0.2, 4);
    ///
    /// assert_eq!(index.range(10.0, 20.0), vec![1, 2]);
    /// // Prices are compared exactly: 0.1 + 0.2 lies just above 0.3
    /// assert!(index.range(0.0, 0.3).is_empty());
    /// ```
    pub fn range(&self, low: f64, high: f64) -> Vec<StockId> {
        let (low, high) = (OrderedFloat(low), OrderedFloat(high));
        let mut identifiers = Vec::new();
        if low <= high {
            collect_range(&self.root, low, high, &mut identifiers);
        }
        identifiers
    }

    /// Returns an in-order iterator over `(price, id)` pairs.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_spine(&self.root);
        iter
    }

    /// Returns the number of indexed stocks.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the height of the tree, 0 when empty.
    pub fn height(&self) -> u32 {
        height(&self.root)
    }
}

/// In-order iterator over a `PriceIndex`.
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut link: &'a Link) {
        while let Some(node) = link {
            self.stack.push(node);
            link = &node.left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (f64, StockId);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(&node.right);
        Some((node.key.price.into_inner(), node.key.id))
    }
}

fn insert_node(link: Link, key: PriceKey) -> (Box<Node>, bool) {
    let Some(mut node) = link else {
        return (Box::new(Node::leaf(key)), true);
    };

    let inserted = match key.cmp(&node.key) {
        Ordering::Less => {
            let (left, inserted) = insert_node(node.left.take(), key);
            node.left = Some(left);
            inserted
        }
        Ordering::Greater => {
            let (right, inserted) = insert_node(node.right.take(), key);
            node.right = Some(right);
            inserted
        }
        Ordering::Equal => return (node, false),
    };

    (rebalance(node), inserted)
}

fn remove_node(link: Link, key: &PriceKey) -> (Link, bool) {
    let Some(mut node) = link else {
        return (None, false);
    };

    match key.cmp(&node.key) {
        Ordering::Less => {
            let (left, removed) = remove_node(node.left.take(), key);
            node.left = left;
            if !removed {
                return (Some(node), false);
            }
        }
        Ordering::Greater => {
            let (right, removed) = remove_node(node.right.take(), key);
            node.right = right;
            if !removed {
                return (Some(node), false);
            }
        }
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (None, right) => return (right, true),
            (left, None) => return (left, true),
            (Some(left), Some(right)) => {
                // Replace with the in-order successor
                let (rest, successor) = take_min(right);
                node.key = successor;
                node.left = Some(left);
                node.right = rest;
            }
        },
    }

    (Some(rebalance(node)), true)
}

/// Detaches the smallest key of a subtree, returning the rebalanced remainder.
fn take_min(mut node: Box<Node>) -> (Link, PriceKey) {
    match node.left.take() {
        None => (node.right.take(), node.key),
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        // Left-right case reduces to left-left
        if balance_factor(&node.left) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }

    if balance < -1 {
        // Right-left case reduces to right-right
        if balance_factor(&node.right) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }

    node
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    match node.right.take() {
        Some(mut pivot) => {
            node.right = pivot.left.take();
            node.update_height();
            pivot.left = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    match node.left.take() {
        Some(mut pivot) => {
            node.left = pivot.right.take();
            node.update_height();
            pivot.right = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

fn collect_range(
    link: &Link,
    low: OrderedFloat<f64>,
    high: OrderedFloat<f64>,
    out: &mut Vec<StockId>,
) {
    let Some(node) = link else {
        return;
    };
    let price = node.key.price;

    // Equal prices may sit on either side of a composite key, hence `>=` and `<=`
    if price >= low {
        collect_range(&node.left, low, high, out);
    }
    if low <= price && price <= high {
        out.push(node.key.id);
    }
    if price <= high {
        collect_range(&node.right, low, high, out);
    }
}
