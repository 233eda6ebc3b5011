//! Closed classification of expression nodes.

use tree_sitter::Node;

/// Expression node kinds the type resolver distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Variable,
    DynamicVariable,
    Integer,
    Float,
    String,
    Boolean,
    Null,
    Array,
    /// A bare or qualified name used as a value: a constant.
    ConstantName,
    Binary,
    Unary,
    Conditional,
    Assignment,
    AugmentedAssignment,
    Cast,
    MemberAccess,
    MemberCall,
    ScopedCall,
    ScopedPropertyAccess,
    ClassConstantAccess,
    Subscript,
    ObjectCreation,
    FunctionCall,
    Closure,
    Clone,
    Parenthesized,
    ErrorSuppression,
    Update,
    Match,
    Include,
    Print,
    ShellCommand,
    Throw,
    Yield,
    Sequence,
    Error,
    Other,
}

impl ExprKind {
    pub fn of(node: &Node) -> Self {
        if node.is_error() || node.is_missing() {
            return ExprKind::Error;
        }
        match node.kind() {
            "variable_name" => ExprKind::Variable,
            "dynamic_variable_name" => ExprKind::DynamicVariable,
            "integer" => ExprKind::Integer,
            "float" => ExprKind::Float,
            "string" | "encapsed_string" | "heredoc" | "nowdoc" => ExprKind::String,
            "boolean" => ExprKind::Boolean,
            "null" => ExprKind::Null,
            "array_creation_expression" => ExprKind::Array,
            "name" | "qualified_name" | "relative_name" => ExprKind::ConstantName,
            "binary_expression" => ExprKind::Binary,
            "unary_op_expression" => ExprKind::Unary,
            "conditional_expression" => ExprKind::Conditional,
            "assignment_expression" | "reference_assignment_expression" => ExprKind::Assignment,
            "augmented_assignment_expression" => ExprKind::AugmentedAssignment,
            "cast_expression" => ExprKind::Cast,
            "member_access_expression" | "nullsafe_member_access_expression" => {
                ExprKind::MemberAccess
            }
            "member_call_expression" | "nullsafe_member_call_expression" => ExprKind::MemberCall,
            "scoped_call_expression" => ExprKind::ScopedCall,
            "scoped_property_access_expression" => ExprKind::ScopedPropertyAccess,
            "class_constant_access_expression" => ExprKind::ClassConstantAccess,
            "subscript_expression" => ExprKind::Subscript,
            "object_creation_expression" => ExprKind::ObjectCreation,
            "function_call_expression" => ExprKind::FunctionCall,
            "anonymous_function" | "arrow_function" => ExprKind::Closure,
            "clone_expression" => ExprKind::Clone,
            "parenthesized_expression" => ExprKind::Parenthesized,
            "error_suppression_expression" => ExprKind::ErrorSuppression,
            "update_expression" => ExprKind::Update,
            "match_expression" => ExprKind::Match,
            "include_expression" | "include_once_expression" | "require_expression"
            | "require_once_expression" => ExprKind::Include,
            "print_intrinsic" => ExprKind::Print,
            "shell_command_expression" => ExprKind::ShellCommand,
            "throw_expression" => ExprKind::Throw,
            "yield_expression" => ExprKind::Yield,
            "sequence_expression" => ExprKind::Sequence,
            _ => ExprKind::Other,
        }
    }
}
