//! Record trees and their projection onto a flat, indexable sequence.
//!
//! Records live in an arena ([`RecordTree`]) and are addressed by id, so a
//! [`FlattenedRow`] never borrows from the data it describes. Flattening is
//! a pure function of the tree and the expanded-key set: an explicit-stack
//! depth-first walk that places every expanded record's descendants in one
//! contiguous block right after it.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{GridError, Result};
use crate::types::{FlattenedRow, RowKey, TreeRecord};

/// Arena of records with parent/child links
#[derive(Debug, Clone)]
pub struct RecordTree<R> {
    records: Vec<R>,
    children: Vec<Vec<usize>>,
    /// Position of each record among its siblings
    sibling_index: Vec<usize>,
    roots: Vec<usize>,
}

impl<R> Default for RecordTree<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            children: Vec::new(),
            sibling_index: Vec::new(),
            roots: Vec::new(),
        }
    }
}

impl<R: TreeRecord> RecordTree<R> {
    /// Build the arena from owned root records, moving each record's
    /// children (stored under `children_field`) into the arena.
    pub fn from_roots(roots: Vec<R>, children_field: &str) -> Self {
        let mut tree = Self::default();
        let mut queue: VecDeque<(R, Option<usize>, usize)> = roots
            .into_iter()
            .enumerate()
            .map(|(i, record)| (record, None, i))
            .collect();

        while let Some((mut record, parent, sibling)) = queue.pop_front() {
            let id = tree.records.len();
            let kids = record.take_children(children_field).unwrap_or_default();
            tree.records.push(record);
            tree.children.push(Vec::new());
            tree.sibling_index.push(sibling);
            match parent.and_then(|p| tree.children.get_mut(p)) {
                Some(siblings) => siblings.push(id),
                None => tree.roots.push(id),
            }
            for (i, child) in kids.into_iter().enumerate() {
                queue.push_back((child, Some(id), i));
            }
        }
        tree
    }
}

impl<R> RecordTree<R> {
    /// Build the arena from explicit links.
    ///
    /// `children[i]` lists the child ids of record `i`. Every record must be
    /// reachable from exactly one root path: links out of range, records with
    /// two parents, unreachable records and cycles are rejected.
    pub fn from_links(records: Vec<R>, roots: Vec<usize>, children: Vec<Vec<usize>>) -> Result<Self> {
        let len = records.len();
        if children.len() != len {
            return Err(GridError::InvalidLink(format!(
                "{} child lists for {} records",
                children.len(),
                len
            )));
        }

        let mut parent: Vec<Option<usize>> = vec![None; len];
        let mut sibling_index = vec![0; len];
        for (id, kids) in children.iter().enumerate() {
            for (pos, &child) in kids.iter().enumerate() {
                let slot = parent.get_mut(child).ok_or_else(|| {
                    GridError::InvalidLink(format!("record {id} links to missing child {child}"))
                })?;
                if slot.is_some() {
                    return Err(GridError::InvalidLink(format!(
                        "record {child} has more than one parent"
                    )));
                }
                *slot = Some(id);
                if let Some(s) = sibling_index.get_mut(child) {
                    *s = pos;
                }
            }
        }

        for (pos, &root) in roots.iter().enumerate() {
            match parent.get(root) {
                None => {
                    return Err(GridError::InvalidLink(format!("root {root} is out of range")));
                }
                Some(Some(_)) => return Err(GridError::CyclicRecord { record: root }),
                Some(None) => {}
            }
            if let Some(s) = sibling_index.get_mut(root) {
                *s = pos;
            }
        }

        // Everything reachable from a root is acyclic once each record has a
        // single parent and roots have none.
        let mut reachable = vec![false; len];
        let mut stack: Vec<usize> = roots.clone();
        while let Some(id) = stack.pop() {
            match reachable.get_mut(id) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            if let Some(kids) = children.get(id) {
                stack.extend(kids.iter().copied());
            }
        }

        for (id, seen) in reachable.iter().enumerate() {
            if *seen {
                continue;
            }
            // Walk up; a record that reaches itself within `len` steps sits
            // on (or below) a cycle.
            let mut cursor = parent.get(id).copied().flatten();
            let mut steps = 0;
            while let Some(p) = cursor {
                if p == id || steps > len {
                    return Err(GridError::CyclicRecord { record: id });
                }
                cursor = parent.get(p).copied().flatten();
                steps += 1;
            }
            return Err(GridError::InvalidLink(format!(
                "record {id} is not reachable from any root"
            )));
        }

        Ok(Self {
            records,
            children,
            sibling_index,
            roots,
        })
    }

    /// Flat list of root records, no children.
    pub fn from_flat(records: Vec<R>) -> Self {
        let len = records.len();
        Self {
            records,
            children: vec![Vec::new(); len],
            sibling_index: (0..len).collect(),
            roots: (0..len).collect(),
        }
    }

    pub fn get(&self, id: usize) -> Option<&R> {
        self.records.get(id)
    }

    pub fn children(&self, id: usize) -> &[usize] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn has_children(&self, id: usize) -> bool {
        !self.children(id).is_empty()
    }

    pub fn sibling_index(&self, id: usize) -> usize {
        self.sibling_index.get(id).copied().unwrap_or(0)
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Total number of records in the arena, expanded or not.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Flatten `tree` into display order.
///
/// A record is followed by its children iff its key is in `expanded`.
/// `row_key` receives the record and its index among its siblings.
///
/// # Errors
/// Returns [`GridError::MissingRowKey`] if `row_key` yields `None` and
/// [`GridError::DuplicateRowKey`] if two visited records share a key.
pub fn flatten<R, K>(
    tree: &RecordTree<R>,
    expanded: &HashSet<RowKey>,
    row_key: K,
) -> Result<Vec<FlattenedRow>>
where
    K: Fn(&R, usize) -> Option<RowKey>,
{
    let mut rows: Vec<FlattenedRow> = Vec::with_capacity(tree.roots.len());
    let mut seen: HashMap<RowKey, usize> = HashMap::new();
    // (record id, indent)
    let mut stack: Vec<(usize, usize)> = tree.roots.iter().rev().map(|&id| (id, 0)).collect();

    while let Some((id, indent)) = stack.pop() {
        let Some(record) = tree.get(id) else {
            continue;
        };
        let sequence_index = rows.len();
        let sibling_index = tree.sibling_index(id);
        let key = row_key(record, sibling_index)
            .ok_or(GridError::MissingRowKey { sequence_index })?;

        if let Some(&first) = seen.get(&key) {
            return Err(GridError::DuplicateRowKey {
                key,
                first,
                second: sequence_index,
            });
        }
        seen.insert(key.clone(), sequence_index);

        if expanded.contains(&key) {
            stack.extend(tree.children(id).iter().rev().map(|&child| (child, indent + 1)));
        }

        rows.push(FlattenedRow {
            record: id,
            row_key: key,
            sequence_index,
            indent,
            sibling_index,
        });
    }

    tracing::debug!(
        records = tree.len(),
        rows = rows.len(),
        expanded = expanded.len(),
        "flattened record tree"
    );
    Ok(rows)
}

/// Keys of every record that has children, i.e. the expanded-key set that
/// opens the whole tree.
///
/// # Errors
/// Returns [`GridError::MissingRowKey`] if a parent record has no key.
pub fn expand_all_keys<R, K>(tree: &RecordTree<R>, row_key: K) -> Result<HashSet<RowKey>>
where
    K: Fn(&R, usize) -> Option<RowKey>,
{
    let mut keys = HashSet::new();
    for (id, record) in tree.records.iter().enumerate() {
        if !tree.has_children(id) {
            continue;
        }
        let key = row_key(record, tree.sibling_index(id))
            .ok_or(GridError::MissingRowKey { sequence_index: id })?;
        keys.insert(key);
    }
    Ok(keys)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::json_key_field;
    use serde_json::{json, Value};

    fn sample_tree() -> RecordTree<Value> {
        RecordTree::from_roots(
            vec![
                json!({"key": "k1"}),
                json!({"key": "k2", "children": [{"key": "k2a"}]}),
                json!({"key": "k3", "children": [
                    {"key": "k3a", "children": [{"key": "k3a1"}]},
                    {"key": "k3b"}
                ]}),
                json!({"key": "k4"}),
            ],
            "children",
        )
    }

    fn keys(rows: &[FlattenedRow]) -> Vec<String> {
        rows.iter()
            .map(|r| match &r.row_key {
                RowKey::Text(s) => s.clone(),
                RowKey::Number(n) => n.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_collapsed_tree_shows_roots() {
        let tree = sample_tree();
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        assert_eq!(keys(&rows), vec!["k1", "k2", "k3", "k4"]);
        assert!(rows.iter().all(|r| r.indent == 0));
        assert_eq!(rows[2].sibling_index, 2);
    }

    #[test]
    fn test_expanding_k3_inserts_two_children() {
        let tree = sample_tree();
        let before = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let expanded: HashSet<RowKey> = [RowKey::from("k3")].into_iter().collect();
        let after = flatten(&tree, &expanded, json_key_field("key")).unwrap();

        assert_eq!(after.len(), before.len() + 2);
        assert_eq!(keys(&after), vec!["k1", "k2", "k3", "k3a", "k3b", "k4"]);
        assert_eq!(after[3].indent, 1);
        assert_eq!(after[4].sibling_index, 1);
        // k4 shifted by +2
        assert_eq!(before[3].sequence_index + 2, after[5].sequence_index);
        for (i, row) in after.iter().enumerate() {
            assert_eq!(row.sequence_index, i);
        }
    }

    #[test]
    fn test_nested_expansion_is_contiguous() {
        let tree = sample_tree();
        let expanded: HashSet<RowKey> = ["k3", "k3a"].into_iter().map(RowKey::from).collect();
        let rows = flatten(&tree, &expanded, json_key_field("key")).unwrap();
        assert_eq!(keys(&rows), vec!["k1", "k2", "k3", "k3a", "k3a1", "k3b", "k4"]);
        assert_eq!(rows[4].indent, 2);
    }

    #[test]
    fn test_expanded_key_without_children_is_noop() {
        let tree = sample_tree();
        let expanded: HashSet<RowKey> = [RowKey::from("k1")].into_iter().collect();
        let rows = flatten(&tree, &expanded, json_key_field("key")).unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_missing_key_fails_fast() {
        let tree = RecordTree::from_roots(vec![json!({"key": 1}), json!({"name": "x"})], "children");
        let err = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap_err();
        assert!(matches!(err, GridError::MissingRowKey { sequence_index: 1 }));
    }

    #[test]
    fn test_duplicate_key_across_levels_fails() {
        let tree = RecordTree::from_roots(
            vec![json!({"key": "a", "children": [{"key": "b"}]}), json!({"key": "b"})],
            "children",
        );
        let expanded: HashSet<RowKey> = [RowKey::from("a")].into_iter().collect();
        let err = flatten(&tree, &expanded, json_key_field("key")).unwrap_err();
        match err {
            GridError::DuplicateRowKey { first, second, .. } => {
                assert_eq!((first, second), (1, 2));
            }
            other => panic!("unexpected error {other:?}"),
        }
        // Collapsed, the nested duplicate is never visited.
        assert!(flatten(&tree, &HashSet::new(), json_key_field("key")).is_ok());
    }

    #[test]
    fn test_from_links_rejects_cycle() {
        // 0 is the root; 1 and 2 point at each other.
        let records = vec![json!({"key": 0}), json!({"key": 1}), json!({"key": 2})];
        let err = RecordTree::from_links(records, vec![0], vec![vec![], vec![2], vec![1]]).unwrap_err();
        assert!(matches!(err, GridError::CyclicRecord { .. }));
    }

    #[test]
    fn test_from_links_rejects_root_with_parent() {
        let records = vec![json!({"key": 0}), json!({"key": 1})];
        let err = RecordTree::from_links(records, vec![0], vec![vec![1], vec![0]]).unwrap_err();
        assert!(matches!(err, GridError::InvalidLink(_) | GridError::CyclicRecord { .. }));
    }

    #[test]
    fn test_from_links_rejects_two_parents() {
        let records = vec![json!({"key": 0}), json!({"key": 1}), json!({"key": 2})];
        let err = RecordTree::from_links(records, vec![0, 1], vec![vec![2], vec![2], vec![]]).unwrap_err();
        assert!(matches!(err, GridError::InvalidLink(_)));
    }

    #[test]
    fn test_from_links_flattens_like_owned_tree() {
        let records = vec![json!({"key": "p"}), json!({"key": "c1"}), json!({"key": "c2"})];
        let tree = RecordTree::from_links(records, vec![0], vec![vec![1, 2], vec![], vec![]]).unwrap();
        let expanded = expand_all_keys(&tree, json_key_field("key")).unwrap();
        let rows = flatten(&tree, &expanded, json_key_field("key")).unwrap();
        assert_eq!(keys(&rows), vec!["p", "c1", "c2"]);
        assert_eq!(rows[2].sibling_index, 1);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        // A 10k-deep chain built by links would overflow a recursive walk.
        let depth: usize = 10_000;
        let records: Vec<i64> = (0..depth).map(|i| i64::try_from(i).unwrap()).collect();
        let children: Vec<Vec<usize>> = (0..depth)
            .map(|i| if i + 1 < depth { vec![i + 1] } else { vec![] })
            .collect();
        let tree = RecordTree::from_links(records, vec![0], children).unwrap();
        let key = |r: &i64, _: usize| Some(RowKey::Number(*r));
        let expanded = expand_all_keys(&tree, key).unwrap();
        let rows = flatten(&tree, &expanded, key).unwrap();
        assert_eq!(rows.len(), depth);
        assert_eq!(rows.last().unwrap().indent, depth - 1);
    }
}
