//! Method scanning and sync/async twin classification.
//!
//! The scanner walks the direct children of one target `impl` block and
//! classifies every method purely by its name, following the project naming
//! convention: a `_` prefix marks an internal method, an `_async` suffix
//! marks the non-blocking variant. Two public records with the same base
//! name and different calling conventions are twins.

use std::collections::BTreeSet;

use quote::ToTokens;

use crate::parse::SourceTree;
use crate::rules::RewriteRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    Blocking,
    NonBlocking,
}

/// One method found inside the target impl block.
#[derive(Debug, Clone)]
pub struct MethodRecord {
    /// Identifier as written in the source.
    pub name: String,
    /// Owned syntax-tree fragment for the whole method.
    pub node: syn::ImplItemFn,
    pub visibility: Visibility,
    pub convention: CallingConvention,
    /// Name with the async suffix stripped when present.
    pub base_name: String,
}

impl MethodRecord {
    pub fn classify(node: syn::ImplItemFn, rules: &RewriteRules) -> Self {
        let name = node.sig.ident.to_string();
        let visibility = if rules.is_internal(&name) {
            Visibility::Internal
        } else {
            Visibility::Public
        };
        let convention = if rules.is_non_blocking(&name) {
            CallingConvention::NonBlocking
        } else {
            CallingConvention::Blocking
        };
        let base_name = rules.base_name(&name).to_string();
        Self {
            name,
            node,
            visibility,
            convention,
            base_name,
        }
    }

    /// Public blocking methods are the synthesis targets.
    pub fn is_target(&self) -> bool {
        self.visibility == Visibility::Public && self.convention == CallingConvention::Blocking
    }
}

/// Result of scanning one impl block.
///
/// `records` keeps source order; `missing` holds every public blocking base
/// name that has no public non-blocking twin.
#[derive(Debug, Default)]
pub struct ClassScan {
    pub records: Vec<MethodRecord>,
    pub missing: BTreeSet<String>,
}

impl ClassScan {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Scan the impl block for `target_impl` in `tree`.
///
/// Only direct children of the matching impl block are considered; methods of
/// impls nested elsewhere in the file are out of scope. An absent impl block
/// yields an empty scan rather than an error: nothing to do is a valid
/// terminal state for the CI gate.
pub fn scan(tree: &SourceTree, target_impl: &str, rules: &RewriteRules) -> ClassScan {
    let mut records = Vec::new();

    for item in &tree.file.items {
        let syn::Item::Impl(item_impl) = item else {
            continue;
        };
        if item_impl.trait_.is_some() || impl_type_name(item_impl).as_deref() != Some(target_impl) {
            continue;
        }
        for impl_item in &item_impl.items {
            if let syn::ImplItem::Fn(method) = impl_item {
                records.push(MethodRecord::classify(method.clone(), rules));
            }
        }
    }

    let missing = missing_twins(&records);
    ClassScan { records, missing }
}

/// Public blocking base names with no public non-blocking twin.
///
/// Blocking methods are the source of truth: an `_async` method without a
/// blocking counterpart is left alone.
fn missing_twins(records: &[MethodRecord]) -> BTreeSet<String> {
    let non_blocking: BTreeSet<&str> = records
        .iter()
        .filter(|r| {
            r.visibility == Visibility::Public && r.convention == CallingConvention::NonBlocking
        })
        .map(|r| r.base_name.as_str())
        .collect();

    records
        .iter()
        .filter(|r| r.is_target() && !non_blocking.contains(r.base_name.as_str()))
        .map(|r| r.base_name.clone())
        .collect()
}

/// Type name an inherent impl block is for.
pub(crate) fn impl_type_name(item_impl: &syn::ItemImpl) -> Option<String> {
    match item_impl.self_ty.as_ref() {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string()),
        other => Some(other.to_token_stream().to_string()),
    }
}
