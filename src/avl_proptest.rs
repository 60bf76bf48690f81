#![cfg(test)]

// Property tests for AvlTree against std::collections::BTreeSet.

use crate::avl::{self, AvlTree, Cursor};
use crate::records::{AvlNode, Keyed};
use proptest::prelude::*;
use std::collections::BTreeSet;

const KEYS: u16 = 64;

#[derive(Debug, Default)]
struct Node {
    key: u16,
    left: Option<usize>,
    right: Option<usize>,
    height: u32,
}

impl AvlNode<usize> for Node {
    fn left(&self) -> Option<usize> {
        self.left
    }
    fn set_left(&mut self, left: Option<usize>) {
        self.left = left;
    }
    fn right(&self) -> Option<usize> {
        self.right
    }
    fn set_right(&mut self, right: Option<usize>) {
        self.right = right;
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn set_height(&mut self, height: u32) {
        self.height = height;
    }
}

impl Keyed for Node {
    type Key = u16;
    fn key(&self) -> &u16 {
        &self.key
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16),
    Remove(u16),
    RemoveMin,
    RemoveMax,
    Lookup(u16),
    Upper(u16),
    Lower(u16),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = 0..KEYS;
    let op = prop_oneof![
        4 => key.clone().prop_map(Op::Insert),
        2 => key.clone().prop_map(Op::Remove),
        1 => Just(Op::RemoveMin),
        1 => Just(Op::RemoveMax),
        1 => key.clone().prop_map(Op::Lookup),
        1 => (0..KEYS + 2).prop_map(Op::Upper),
        1 => (0..KEYS + 2).prop_map(Op::Lower),
    ];
    proptest::collection::vec(op, 1..200)
}

/// Height of the subtree at `node` if it is ordered and balanced.
fn checked_height(nodes: &[Node], node: Option<usize>) -> Result<u32, String> {
    let Some(n) = node else { return Ok(0) };
    let hl = checked_height(nodes, nodes[n].left)?;
    let hr = checked_height(nodes, nodes[n].right)?;
    if hl.abs_diff(hr) > 1 {
        return Err(format!("key {} has balance {}", nodes[n].key, hr as i64 - hl as i64));
    }
    if nodes[n].height != 1 + hl.max(hr) {
        return Err(format!("key {} caches a stale height", nodes[n].key));
    }
    Ok(1 + hl.max(hr))
}

// Property: State-machine equivalence against BTreeSet.
// - Duplicate inserts are rejected and name the resident record.
// - Every remove returns the record inserted for that key.
// - Balance and cached heights hold after every operation.
// - Ascending traversal matches the model; upper/lower enumerate exactly
//   the model's tail/head ranges.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        // One record per key with record index == key, plus a spare record
        // for probing duplicate inserts.
        let mut nodes: Vec<Node> = (0..=KEYS).map(|key| Node { key, ..Default::default() }).collect();
        let spare = usize::from(KEYS);
        let mut tree: AvlTree<usize, u16> = AvlTree::new();
        let mut cursor = Cursor::new();
        let mut model: BTreeSet<u16> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(k) => {
                    if model.insert(k) {
                        prop_assert_eq!(tree.insert(&mut nodes, &mut cursor, k as usize), Ok(()));
                    } else {
                        nodes[spare].key = k;
                        prop_assert_eq!(tree.insert(&mut nodes, &mut cursor, spare), Err(k as usize));
                        prop_assert!(nodes[spare].left.is_none() && nodes[spare].right.is_none());
                    }
                }
                Op::Remove(k) => {
                    let got = tree.remove(&mut nodes, &mut cursor, &k);
                    let want = model.remove(&k).then_some(k as usize);
                    prop_assert_eq!(got, want);
                }
                Op::RemoveMin => {
                    let want = model.pop_first().map(usize::from);
                    prop_assert_eq!(tree.remove_min(&mut nodes, &mut cursor), want);
                }
                Op::RemoveMax => {
                    let want = model.pop_last().map(usize::from);
                    prop_assert_eq!(tree.remove_max(&mut nodes, &mut cursor), want);
                }
                Op::Lookup(k) => {
                    let want = model.contains(&k).then_some(k as usize);
                    prop_assert_eq!(tree.lookup(&nodes, &k), want);
                }
                Op::Upper(k) => {
                    tree.upper(&nodes, &mut cursor, &k);
                    let got: Vec<u16> = std::iter::from_fn(|| avl::next(&nodes, &mut cursor))
                        .map(|h| nodes[h].key)
                        .collect();
                    let want: Vec<u16> = model.range(k..).copied().collect();
                    prop_assert_eq!(got, want);
                }
                Op::Lower(k) => {
                    tree.lower(&nodes, &mut cursor, &k);
                    let got: Vec<u16> = std::iter::from_fn(|| avl::prior(&nodes, &mut cursor))
                        .map(|h| nodes[h].key)
                        .collect();
                    let want: Vec<u16> = model.range(..=k).rev().copied().collect();
                    prop_assert_eq!(got, want);
                }
            }

            prop_assert_eq!(tree.len(), model.len());
            prop_assert_eq!(tree.is_empty(), model.is_empty());
            if let Err(msg) = checked_height(&nodes, tree.root()) {
                prop_assert!(false, "{}", msg);
            }
            let keys: Vec<u16> = tree.iter(&nodes).map(|h| nodes[h].key).collect();
            let want: Vec<u16> = model.iter().copied().collect();
            prop_assert_eq!(keys, want);
            prop_assert_eq!(tree.min(&nodes), model.first().map(|&k| usize::from(k)));
            prop_assert_eq!(tree.max(&nodes), model.last().map(|&k| usize::from(k)));
        }
    }
}
