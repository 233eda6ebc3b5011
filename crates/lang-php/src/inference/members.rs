//! Member lookup on receiver types.

use super::context::InferContext;
use phpscope_api::models::symbol::{PhpSymbol, SymbolKind};
use phpscope_api::models::types::TypeString;
use phpscope_api::store::MemberMatch;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Method,
    Constant,
}

impl MemberKind {
    fn symbol_kind(self) -> SymbolKind {
        match self {
            MemberKind::Property => SymbolKind::Property,
            MemberKind::Method => SymbolKind::Method,
            MemberKind::Constant => SymbolKind::ClassConstant,
        }
    }
}

/// Finds `name` on `class` through the hierarchy walk.
pub fn find_member(
    ctx: &InferContext,
    class: &str,
    kind: MemberKind,
    name: &str,
) -> Option<MemberMatch> {
    let symbol = ctx.store.find_class(class)?;
    ctx.store.find_member(
        &symbol,
        kind.symbol_kind(),
        name,
        ctx.config.max_hierarchy_depth,
    )
}

/// Union of the member's type over every class in `receiver`.
///
/// `self` in the member type becomes the declaring class, or the using class
/// for trait members. `static` and `$this` become `bound` when given, else the
/// receiver class.
pub fn member_type(
    ctx: &InferContext,
    receiver: &TypeString,
    kind: MemberKind,
    name: &str,
    bound: Option<&str>,
) -> TypeString {
    let mut result = TypeString::unknown();
    for class in receiver.class_types() {
        match find_member(ctx, class, kind, name) {
            Some(found) => {
                let late_static = bound.unwrap_or(class);
                let self_class = if found.declaring.kind == SymbolKind::Trait {
                    trait_user(ctx, class, &found.declaring.name)
                        .unwrap_or_else(|| late_static.to_string())
                } else {
                    found.declaring.name.clone()
                };
                result.union_with(&found.member.type_string.resolve_self(&self_class, late_static));
            }
            None => tracing::debug!(class, member = name, "member not found"),
        }
    }
    result
}

/// The class in `class`'s parent chain that uses `trait_name` directly.
fn trait_user(ctx: &InferContext, class: &str, trait_name: &str) -> Option<String> {
    let symbol = ctx.store.find_class(class)?;
    let ancestors = ctx
        .store
        .base_classes(&symbol, ctx.config.max_hierarchy_depth);
    std::iter::once(symbol)
        .chain(ancestors)
        .find(|candidate| {
            candidate
                .traits()
                .any(|used| used.eq_ignore_ascii_case(trait_name))
        })
        .map(|user| user.name.clone())
}

/// Members visible on `class`, inherited ones included.
pub fn visible_members(ctx: &InferContext, class: &str) -> Vec<Arc<PhpSymbol>> {
    ctx.store
        .find_class(class)
        .map(|symbol| {
            ctx.store
                .find_members(&symbol, true, ctx.config.max_hierarchy_depth)
        })
        .unwrap_or_default()
}

/// First method named `name` on any class in `receiver`.
pub fn find_method(ctx: &InferContext, receiver: &TypeString, name: &str) -> Option<Arc<PhpSymbol>> {
    receiver
        .class_types()
        .find_map(|class| find_member(ctx, class, MemberKind::Method, name))
        .map(|found| found.member)
}
