//! Splicing synthesized twins back into the class body.

use std::collections::BTreeMap;

use crate::parse::SourceTree;
use crate::scan::{impl_type_name, MethodRecord};

/// Build a new tree with each synthesized twin inserted immediately after
/// its blocking counterpart in the target impl block.
///
/// The input tree is left untouched so it can be diffed against the result;
/// the synthesized map is consumed, its nodes move into the new tree. Every
/// other item keeps its position.
pub fn rebuild(
    tree: &SourceTree,
    target_impl: &str,
    mut synthesized: BTreeMap<String, MethodRecord>,
) -> SourceTree {
    let mut file = tree.file.clone();

    for item in &mut file.items {
        let syn::Item::Impl(item_impl) = item else {
            continue;
        };
        if item_impl.trait_.is_some() || impl_type_name(item_impl).as_deref() != Some(target_impl) {
            continue;
        }

        let mut items = Vec::with_capacity(item_impl.items.len() + synthesized.len());
        for impl_item in item_impl.items.drain(..) {
            let twin = match &impl_item {
                syn::ImplItem::Fn(method) => synthesized.remove(&method.sig.ident.to_string()),
                _ => None,
            };
            items.push(impl_item);
            if let Some(record) = twin {
                items.push(syn::ImplItem::Fn(record.node));
            }
        }
        item_impl.items = items;
    }

    SourceTree { file }
}
