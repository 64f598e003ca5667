//! Path-addressed edits over a filter tree.
//!
//! Every edit is persistent: the ancestors of the changed node are rebuilt and
//! every other subtree is shared with the input by `Arc`. When a path does not
//! address a node of the expected kind the input root is handed back as-is, so
//! callers can detect a no-op with `Arc::ptr_eq`.

use super::ast::{is_range_operator, FilterColumn, FilterCondition, FilterGroup, FilterNode, Join};
use std::sync::Arc;
use tracing::trace;

/// Which of a condition's two values to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueField {
    Value,
    ValueTo,
}

/// Resolve `path` from `root`. The empty path addresses the root itself.
pub fn find_node_at_path(root: &Arc<FilterGroup>, path: &[usize]) -> Option<FilterNode> {
    let mut node = FilterNode::Group(Arc::clone(root));
    for &index in path {
        let FilterNode::Group(group) = &node else {
            return None;
        };
        node = group.nodes.get(index)?.clone();
    }
    Some(node)
}

pub fn update_group_condition_value(
    root: &Arc<FilterGroup>,
    path: &[usize],
    field: ValueField,
    new_value: &str,
) -> Arc<FilterGroup> {
    update_condition(root, path, |condition| {
        let mut next = condition.clone();
        match field {
            ValueField::Value => next.value = Some(new_value.to_string()),
            ValueField::ValueTo => next.value_to = Some(new_value.to_string()),
        }
        next
    })
}

/// Attach a new column. Operator and values are left alone.
pub fn update_group_condition_column(
    root: &Arc<FilterGroup>,
    path: &[usize],
    new_column: &FilterColumn,
) -> Arc<FilterGroup> {
    update_condition(root, path, |condition| FilterCondition {
        field: new_column.field.clone(),
        column: Some(new_column.clone()),
        ..condition.clone()
    })
}

/// Replace the operator. Switching to a range operator seeds a missing
/// `value_to` from `value`.
pub fn update_group_condition_operator(
    root: &Arc<FilterGroup>,
    path: &[usize],
    new_operator: &str,
) -> Arc<FilterGroup> {
    update_condition(root, path, |condition| {
        let mut next = condition.clone();
        next.operator = new_operator.to_string();
        if is_range_operator(new_operator) && next.value_to.is_none() {
            next.value_to = next.value.clone();
        }
        next
    })
}

pub fn update_group_join_at_path(
    root: &Arc<FilterGroup>,
    path: &[usize],
    new_join: Join,
) -> Arc<FilterGroup> {
    let updated = map_group_at(root, path, |group| {
        (group.join != new_join).then(|| FilterGroup {
            join: new_join,
            nodes: group.nodes.clone(),
        })
    });
    identity_on_noop(root, updated, "update join", path)
}

/// Remove the node at `path`. The root cannot be removed, and a parent left
/// with no children stays in the tree.
pub fn remove_group_node_at_path(root: &Arc<FilterGroup>, path: &[usize]) -> Arc<FilterGroup> {
    let updated = split_last(path).and_then(|(parent, index)| {
        map_group_at(root, parent, |group| {
            if index >= group.nodes.len() {
                return None;
            }
            let mut nodes = group.nodes.clone();
            nodes.remove(index);
            Some(FilterGroup::new(group.join, nodes))
        })
    });
    identity_on_noop(root, updated, "remove", path)
}

/// Replace the group at `path` with its own children, flattening one level.
pub fn unwrap_group_at_path(root: &Arc<FilterGroup>, path: &[usize]) -> Arc<FilterGroup> {
    let updated = split_last(path).and_then(|(parent, index)| {
        map_group_at(root, parent, |group| {
            let FilterNode::Group(inner) = group.nodes.get(index)? else {
                return None;
            };
            let mut nodes = Vec::with_capacity(group.nodes.len() - 1 + inner.nodes.len());
            nodes.extend(group.nodes[..index].iter().cloned());
            nodes.extend(inner.nodes.iter().cloned());
            nodes.extend(group.nodes[index + 1..].iter().cloned());
            Some(FilterGroup::new(group.join, nodes))
        })
    });
    identity_on_noop(root, updated, "unwrap", path)
}

fn update_condition<F>(root: &Arc<FilterGroup>, path: &[usize], f: F) -> Arc<FilterGroup>
where
    F: FnOnce(&FilterCondition) -> FilterCondition,
{
    let updated = split_last(path).and_then(|(parent, index)| {
        map_group_at(root, parent, |group| {
            let FilterNode::Condition(condition) = group.nodes.get(index)? else {
                return None;
            };
            let mut nodes = group.nodes.clone();
            nodes[index] = FilterNode::Condition(Arc::new(f(condition)));
            Some(FilterGroup::new(group.join, nodes))
        })
    });
    identity_on_noop(root, updated, "update condition", path)
}

/// Apply `f` to the group addressed by `path` and rebuild its ancestors.
/// Returns `None` when the path does not reach a group or `f` declines.
fn map_group_at<F>(group: &Arc<FilterGroup>, path: &[usize], f: F) -> Option<Arc<FilterGroup>>
where
    F: FnOnce(&FilterGroup) -> Option<FilterGroup>,
{
    let Some((&index, rest)) = path.split_first() else {
        return f(group).map(Arc::new);
    };

    let FilterNode::Group(child) = group.nodes.get(index)? else {
        return None;
    };
    let child = map_group_at(child, rest, f)?;

    let mut nodes = group.nodes.clone();
    nodes[index] = FilterNode::Group(child);
    Some(Arc::new(FilterGroup::new(group.join, nodes)))
}

fn split_last(path: &[usize]) -> Option<(&[usize], usize)> {
    let (&last, parent) = path.split_last()?;
    Some((parent, last))
}

fn identity_on_noop(
    root: &Arc<FilterGroup>,
    updated: Option<Arc<FilterGroup>>,
    action: &str,
    path: &[usize],
) -> Arc<FilterGroup> {
    updated.unwrap_or_else(|| {
        trace!(action, ?path, "edit did not apply, keeping tree");
        Arc::clone(root)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ast::ColumnType;

    fn cond(field: &str, op: &str, value: &str) -> FilterNode {
        FilterCondition::new(field, op).with_value(value).into()
    }

    // AND[ name contains aspirin, OR[ stock equals 10, price gt 5 ], qty lt 3 ]
    fn sample() -> Arc<FilterGroup> {
        let inner = FilterGroup::new(
            Join::Or,
            vec![cond("stock", "equals", "10"), cond("price", "gt", "5")],
        );
        Arc::new(FilterGroup::new(
            Join::And,
            vec![
                cond("name", "contains", "aspirin"),
                inner.into(),
                cond("qty", "lt", "3"),
            ],
        ))
    }

    fn condition_at(root: &Arc<FilterGroup>, path: &[usize]) -> Arc<FilterCondition> {
        find_node_at_path(root, path)
            .and_then(|n| n.as_condition().cloned())
            .unwrap()
    }

    #[test]
    fn test_find_nested() {
        let root = sample();
        let node = find_node_at_path(&root, &[1, 0]).unwrap();
        assert_eq!(node.as_condition().unwrap().field, "stock");
        assert!(node.ptr_eq(&root.nodes[1].as_group().unwrap().nodes[0]));
    }

    #[test]
    fn test_find_empty_path_is_root() {
        let root = sample();
        let node = find_node_at_path(&root, &[]).unwrap();
        assert!(Arc::ptr_eq(node.as_group().unwrap(), &root));
    }

    #[test]
    fn test_find_invalid_paths() {
        let root = sample();
        assert!(find_node_at_path(&root, &[3]).is_none());
        assert!(find_node_at_path(&root, &[0, 0]).is_none());
        assert!(find_node_at_path(&root, &[1, 2]).is_none());
    }

    #[test]
    fn test_update_value_shares_siblings() {
        let root = sample();
        let next = update_group_condition_value(&root, &[1, 1], ValueField::Value, "7");

        assert!(!Arc::ptr_eq(&root, &next));
        assert_eq!(condition_at(&next, &[1, 1]).value.as_deref(), Some("7"));
        assert_eq!(condition_at(&next, &[1, 1]).operator, "gt");
        assert!(next.nodes[0].ptr_eq(&root.nodes[0]));
        assert!(next.nodes[2].ptr_eq(&root.nodes[2]));
        let old_inner = root.nodes[1].as_group().unwrap();
        let new_inner = next.nodes[1].as_group().unwrap();
        assert!(new_inner.nodes[0].ptr_eq(&old_inner.nodes[0]));
        // input untouched
        assert_eq!(condition_at(&root, &[1, 1]).value.as_deref(), Some("5"));
    }

    #[test]
    fn test_update_value_to() {
        let root = sample();
        let next = update_group_condition_value(&root, &[0], ValueField::ValueTo, "z");
        let c = condition_at(&next, &[0]);
        assert_eq!(c.value.as_deref(), Some("aspirin"));
        assert_eq!(c.value_to.as_deref(), Some("z"));
    }

    #[test]
    fn test_condition_mutators_are_identity_on_wrong_kind() {
        let root = sample();
        let column = FilterColumn::new("sku", ColumnType::Text);
        for path in [&[][..], &[1][..], &[9][..], &[0, 0][..]] {
            assert!(Arc::ptr_eq(
                &root,
                &update_group_condition_value(&root, path, ValueField::Value, "x")
            ));
            assert!(Arc::ptr_eq(
                &root,
                &update_group_condition_column(&root, path, &column)
            ));
            assert!(Arc::ptr_eq(
                &root,
                &update_group_condition_operator(&root, path, "inRange")
            ));
        }
    }

    #[test]
    fn test_update_column_keeps_operator_and_value() {
        let root = sample();
        let column = FilterColumn::new("sku", ColumnType::Text);
        let next = update_group_condition_column(&root, &[0], &column);
        let c = condition_at(&next, &[0]);
        assert_eq!(c.field, "sku");
        assert_eq!(c.column.as_ref(), Some(&column));
        assert_eq!(c.operator, "contains");
        assert_eq!(c.value.as_deref(), Some("aspirin"));
    }

    #[test]
    fn test_range_operator_seeds_value_to() {
        let root = sample();
        let next = update_group_condition_operator(&root, &[1, 0], "inRange");
        let c = condition_at(&next, &[1, 0]);
        assert_eq!(c.operator, "inRange");
        assert_eq!(c.value_to.as_deref(), Some("10"));
    }

    #[test]
    fn test_range_operator_keeps_existing_value_to() {
        let root = Arc::new(FilterGroup::new(
            Join::And,
            vec![FilterCondition::new("price", "gt")
                .with_value("1")
                .with_value_to("9")
                .into()],
        ));
        let next = update_group_condition_operator(&root, &[0], "inRange");
        assert_eq!(condition_at(&next, &[0]).value_to.as_deref(), Some("9"));
    }

    #[test]
    fn test_plain_operator_does_not_seed() {
        let root = sample();
        let next = update_group_condition_operator(&root, &[0], "startsWith");
        let c = condition_at(&next, &[0]);
        assert_eq!(c.operator, "startsWith");
        assert!(c.value_to.is_none());
    }

    #[test]
    fn test_update_join() {
        let root = sample();
        let next = update_group_join_at_path(&root, &[], Join::Or);
        assert_eq!(next.join, Join::Or);
        assert!(next.nodes[1].ptr_eq(&root.nodes[1]));

        let next = update_group_join_at_path(&root, &[1], Join::And);
        assert_eq!(next.join, Join::And);
        assert_eq!(next.nodes[1].as_group().unwrap().join, Join::And);
        assert!(next.nodes[0].ptr_eq(&root.nodes[0]));
    }

    #[test]
    fn test_update_join_noops() {
        let root = sample();
        assert!(Arc::ptr_eq(&root, &update_group_join_at_path(&root, &[0], Join::Or)));
        assert!(Arc::ptr_eq(&root, &update_group_join_at_path(&root, &[5], Join::Or)));
        assert!(Arc::ptr_eq(&root, &update_group_join_at_path(&root, &[], Join::And)));
    }

    #[test]
    fn test_remove_keeps_empty_group() {
        let inner = FilterGroup::new(Join::Or, vec![cond("stock", "equals", "1")]);
        let root = Arc::new(FilterGroup::new(
            Join::And,
            vec![cond("name", "contains", "a"), inner.into()],
        ));
        let next = remove_group_node_at_path(&root, &[1, 0]);
        assert_eq!(next.nodes.len(), 2);
        assert!(next.nodes[1].as_group().unwrap().is_empty());
        assert!(next.nodes[0].ptr_eq(&root.nodes[0]));
    }

    #[test]
    fn test_remove_top_level() {
        let root = sample();
        let next = remove_group_node_at_path(&root, &[0]);
        assert_eq!(next.nodes.len(), 2);
        assert!(next.nodes[0].ptr_eq(&root.nodes[1]));
    }

    #[test]
    fn test_remove_noops() {
        let root = sample();
        assert!(Arc::ptr_eq(&root, &remove_group_node_at_path(&root, &[])));
        assert!(Arc::ptr_eq(&root, &remove_group_node_at_path(&root, &[3])));
        assert!(Arc::ptr_eq(&root, &remove_group_node_at_path(&root, &[0, 0])));
    }

    #[test]
    fn test_unwrap_flattens_one_level() {
        let root = sample();
        let next = unwrap_group_at_path(&root, &[1]);
        let inner = root.nodes[1].as_group().unwrap();

        assert_eq!(next.nodes.len(), root.nodes.len() - 1 + inner.nodes.len());
        assert_eq!(next.join, Join::And);
        assert!(next.nodes[0].ptr_eq(&root.nodes[0]));
        assert!(next.nodes[1].ptr_eq(&inner.nodes[0]));
        assert!(next.nodes[2].ptr_eq(&inner.nodes[1]));
        assert!(next.nodes[3].ptr_eq(&root.nodes[2]));
    }

    #[test]
    fn test_unwrap_leaves_grandchildren() {
        let deep = FilterGroup::new(Join::And, vec![cond("a", "eq", "1")]);
        let mid = FilterGroup::new(Join::Or, vec![deep.into(), cond("b", "eq", "2")]);
        let root = Arc::new(FilterGroup::new(Join::And, vec![mid.into()]));

        let next = unwrap_group_at_path(&root, &[0]);
        assert_eq!(next.nodes.len(), 2);
        assert!(next.nodes[0].as_group().is_some());
    }

    #[test]
    fn test_unwrap_noops() {
        let root = sample();
        assert!(Arc::ptr_eq(&root, &unwrap_group_at_path(&root, &[])));
        assert!(Arc::ptr_eq(&root, &unwrap_group_at_path(&root, &[0])));
        assert!(Arc::ptr_eq(&root, &unwrap_group_at_path(&root, &[1, 0])));
    }
}
