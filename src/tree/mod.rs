pub mod ast;
pub mod edit;

pub use ast::{
    is_range_operator, ColumnType, FilterColumn, FilterCondition, FilterGroup, FilterNode, Join,
};
pub use edit::{
    find_node_at_path, remove_group_node_at_path, unwrap_group_at_path,
    update_group_condition_column, update_group_condition_operator, update_group_condition_value,
    update_group_join_at_path, ValueField,
};
