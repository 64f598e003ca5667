use crate::tree::{FilterCondition, FilterGroup, FilterNode};

/// Render a tree back into the text pattern. `confirmed` appends `##`.
///
/// Values are written as typed. A blank value renders like a missing one, so
/// the condition reads back as unfilled.
pub fn format_pattern(root: &FilterGroup, confirmed: bool) -> String {
    let mut out = String::new();
    write_nodes(&mut out, root);
    if confirmed && !out.is_empty() {
        out.push_str("##");
    }
    out
}

fn write_nodes(out: &mut String, group: &FilterGroup) {
    for (i, node) in group.nodes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(group.join.token());
            out.push(' ');
        }
        match node {
            FilterNode::Condition(condition) => write_condition(out, condition),
            FilterNode::Group(inner) if inner.is_empty() => out.push_str("#( #)"),
            FilterNode::Group(inner) => {
                out.push_str("#( ");
                write_nodes(out, inner);
                out.push_str(" #)");
            }
        }
    }
}

fn write_condition(out: &mut String, condition: &FilterCondition) {
    out.push('#');
    out.push_str(&condition.field);
    out.push_str(" #");
    out.push_str(&condition.operator);
    let Some(value) = condition.value.as_deref().filter(|v| !v.trim().is_empty()) else {
        return;
    };
    out.push(' ');
    out.push_str(value);
    if let Some(value_to) = condition.value_to.as_ref().filter(|_| condition.is_range()) {
        out.push_str(" #to ");
        out.push_str(value_to);
    }
}
