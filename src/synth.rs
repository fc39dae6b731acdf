//! Async twin synthesis.
//!
//! Takes one blocking [`MethodRecord`] and produces its non-blocking twin:
//! renamed with the async suffix, marked `async`, blocking resource
//! parameters swapped for their async counterparts, and the body rewritten by
//! a fixed set of call-rewrite passes. Node shapes the passes do not
//! recognize are left unchanged; the transform is best-effort by design and
//! the round-trip verifier reports anything that slipped through.

use std::collections::BTreeMap;
use std::mem;

use proc_macro2::TokenStream;
use regex::Regex;
use syn::visit_mut::{self, VisitMut};
use syn::parse_quote;

use crate::rules::RewriteRules;
use crate::scan::{ClassScan, MethodRecord};

pub struct Synthesizer {
    rules: RewriteRules,
    /// `client.method(args)` inside doc examples, for the configured receivers.
    doc_call_re: Option<Regex>,
    doc_call_replacement: String,
    /// Blocking sleeps inside doc examples.
    doc_sleep_re: Regex,
}

impl Synthesizer {
    pub fn new(rules: RewriteRules) -> Self {
        let doc_call_re = if rules.doc_receivers.is_empty() {
            None
        } else {
            let receivers = rules
                .doc_receivers
                .iter()
                .map(|r| regex::escape(r))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?P<recv>\b(?:{receivers})\.)(?P<m>\w+)\((?P<args>[^()]*)\)");
            Some(Regex::new(&pattern).expect("doc receiver names produce a valid pattern"))
        };
        let doc_call_replacement = format!("${{recv}}${{m}}{}(${{args}}).await", rules.async_suffix);
        let doc_sleep_re = Regex::new(r"\b(?:std::)?thread::sleep\((?P<d>[^()]*)\)")
            .expect("sleep pattern is valid");

        Self {
            rules,
            doc_call_re,
            doc_call_replacement,
            doc_sleep_re,
        }
    }

    pub fn rules(&self) -> &RewriteRules {
        &self.rules
    }

    /// Build the non-blocking twin of one blocking method.
    pub fn synthesize(&self, record: &MethodRecord) -> MethodRecord {
        let mut node = record.node.clone();
        let base = record.base_name.clone();

        node.sig.ident = syn::Ident::new(&self.rules.async_name(&base), node.sig.ident.span());
        node.sig.asyncness = Some(Default::default());
        self.rewrite_resource_params(&mut node.sig);

        let mut rewriter = CallRewriter { rules: &self.rules };
        rewriter.visit_block_mut(&mut node.block);
        rewrite_returns(&mut node.block);
        self.rewrite_docs(&mut node, &base);

        MethodRecord::classify(node, &self.rules)
    }

    /// Synthesize a twin for every entry in the scan's missing set, keyed by
    /// base name.
    pub fn synthesize_all(&self, scan: &ClassScan) -> BTreeMap<String, MethodRecord> {
        scan.records
            .iter()
            .filter(|r| r.is_target() && scan.missing.contains(&r.base_name))
            .map(|r| (r.base_name.clone(), self.synthesize(r)))
            .collect()
    }

    /// Swap blocking resource types for their async counterparts in
    /// parameter position (`session: &mut Session` -> `&mut AsyncSession`).
    fn rewrite_resource_params(&self, sig: &mut syn::Signature) {
        for input in &mut sig.inputs {
            if let syn::FnArg::Typed(pat_ty) = input {
                self.rewrite_resource_type(&mut pat_ty.ty);
            }
        }
    }

    fn rewrite_resource_type(&self, ty: &mut syn::Type) {
        match ty {
            syn::Type::Reference(reference) => self.rewrite_resource_type(&mut reference.elem),
            syn::Type::Paren(paren) => self.rewrite_resource_type(&mut paren.elem),
            syn::Type::Path(type_path) => {
                if let Some(segment) = type_path.path.segments.last_mut() {
                    if let Some(async_ty) = self.rules.resource_types.get(&segment.ident.to_string())
                    {
                        segment.ident = syn::Ident::new(async_ty, segment.ident.span());
                    }
                }
            }
            _ => {}
        }
    }

    /// Regex passes over the method's doc comment lines: calls on configured
    /// receivers get the async suffix and a trailing `.await`, blocking
    /// sleeps become `tokio::time::sleep(..).await`, and if no line carries
    /// an asynchrony marker word a closing note is appended.
    fn rewrite_docs(&self, node: &mut syn::ImplItemFn, base_name: &str) {
        let mut has_docs = false;
        let mut saw_marker = false;

        for attr in &mut node.attrs {
            if !attr.path().is_ident("doc") {
                continue;
            }
            let syn::Meta::NameValue(name_value) = &mut attr.meta else {
                continue;
            };
            let syn::Expr::Lit(expr_lit) = &mut name_value.value else {
                continue;
            };
            let syn::Lit::Str(lit) = &expr_lit.lit else {
                continue;
            };
            has_docs = true;

            let text = lit.value();
            let span = lit.span();
            let rewritten = self.rewrite_doc_line(&text);
            saw_marker |= self.rules.has_async_marker(&rewritten);
            if rewritten != text {
                expr_lit.lit = syn::Lit::Str(syn::LitStr::new(&rewritten, span));
            }
        }

        if has_docs && !saw_marker {
            let note = format!(" Async variant of [`{base_name}`].");
            node.attrs.push(parse_quote!(#[doc = ""]));
            node.attrs.push(parse_quote!(#[doc = #note]));
        }
    }

    fn rewrite_doc_line(&self, line: &str) -> String {
        let line = match &self.doc_call_re {
            Some(re) => re
                .replace_all(line, self.doc_call_replacement.as_str())
                .into_owned(),
            None => line.to_string(),
        };
        self.doc_sleep_re
            .replace_all(&line, "tokio::time::sleep(${d}).await")
            .into_owned()
    }
}

/// Body rewrite visitor: dispatch-alias renames, operation references passed
/// as arguments, and suspension points on resource-variable calls.
struct CallRewriter<'a> {
    rules: &'a RewriteRules,
}

impl CallRewriter<'_> {
    /// `PgmqOperation::send` passed as a call argument becomes
    /// `PgmqOperation::send_async`.
    fn rewrite_operation_ref(&self, expr: &mut syn::Expr) {
        let syn::Expr::Path(expr_path) = expr else {
            return;
        };
        if expr_path.qself.is_some() || expr_path.path.segments.len() < 2 {
            return;
        }
        let first = expr_path.path.segments[0].ident.to_string();
        if !self.rules.operation_types.contains(&first) {
            return;
        }
        let Some(last) = expr_path.path.segments.last_mut() else {
            return;
        };
        let name = last.ident.to_string();
        if !self.rules.is_non_blocking(&name) {
            last.ident = syn::Ident::new(&self.rules.async_name(&name), last.ident.span());
        }
    }
}

impl VisitMut for CallRewriter<'_> {
    fn visit_expr_mut(&mut self, expr: &mut syn::Expr) {
        // Children first, so a wrapped call is final when its parent looks
        // at it.
        visit_mut::visit_expr_mut(self, expr);

        let mut wrap_await = false;
        match expr {
            syn::Expr::MethodCall(call) => {
                if receiver_ident(&call.receiver).as_deref() == Some("self") {
                    if let Some(alias) = self.rules.dispatch_aliases.get(&call.method.to_string()) {
                        call.method = syn::Ident::new(alias, call.method.span());
                    }
                }
                for arg in &mut call.args {
                    self.rewrite_operation_ref(arg);
                }

                wrap_await = receiver_ident(&call.receiver)
                    .is_some_and(|id| self.rules.resource_vars.contains(&id))
                    && self.rules.awaited_methods.contains(&call.method.to_string());
            }
            syn::Expr::Call(call) => {
                for arg in &mut call.args {
                    self.rewrite_operation_ref(arg);
                }
            }
            _ => {}
        }

        if wrap_await {
            wrap_in_await(expr);
        }
    }
}

/// Wrap explicit `return <call>` statements and a call-shaped trailing
/// expression in `.await`. Only the method body's own statements are
/// considered: returns inside nested closures belong to the closure, and
/// non-call return values are deliberately left alone.
fn rewrite_returns(block: &mut syn::Block) {
    let last = block.stmts.len().saturating_sub(1);
    for (i, stmt) in block.stmts.iter_mut().enumerate() {
        match stmt {
            syn::Stmt::Expr(syn::Expr::Return(ret), _) => {
                if let Some(value) = ret.expr.as_deref_mut() {
                    if is_call_shaped(value) {
                        wrap_in_await(value);
                    }
                }
            }
            // A trailing expression is the idiomatic return position.
            syn::Stmt::Expr(expr, None) if i == last => {
                if is_call_shaped(expr) {
                    wrap_in_await(expr);
                }
            }
            _ => {}
        }
    }
}

fn is_call_shaped(expr: &syn::Expr) -> bool {
    matches!(expr, syn::Expr::Call(_) | syn::Expr::MethodCall(_))
}

fn wrap_in_await(expr: &mut syn::Expr) {
    let inner = mem::replace(expr, syn::Expr::Verbatim(TokenStream::new()));
    *expr = parse_quote!(#inner.await);
}

fn receiver_ident(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::Path(path) if path.path.segments.len() == 1 => {
            Some(path.path.segments[0].ident.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::SourceTree;
    use crate::scan::{scan, CallingConvention};

    fn record_for(impl_body: &str) -> MethodRecord {
        let source = format!("impl PgmqQueue {{ {impl_body} }}");
        let tree = SourceTree::parse(&source).unwrap();
        let mut result = scan(&tree, "PgmqQueue", &RewriteRules::default());
        result.records.remove(0)
    }

    fn render(node: &syn::ImplItemFn) -> String {
        let file: syn::File = parse_quote! {
            impl PgmqQueue {
                #node
            }
        };
        prettyplease::unparse(&file)
    }

    fn synthesize(impl_body: &str) -> (MethodRecord, String) {
        let synthesizer = Synthesizer::new(RewriteRules::default());
        let twin = synthesizer.synthesize(&record_for(impl_body));
        let rendered = render(&twin.node);
        (twin, rendered)
    }

    #[test]
    fn test_signature_becomes_async_with_suffix() {
        let (twin, rendered) = synthesize("pub fn create_queue(&self, queue: &str) {}");

        assert_eq!(twin.name, "create_queue_async");
        assert_eq!(twin.base_name, "create_queue");
        assert_eq!(twin.convention, CallingConvention::NonBlocking);
        assert!(rendered.contains("pub async fn create_queue_async(&self, queue: &str)"));
    }

    #[test]
    fn test_dispatch_alias_rewritten() {
        let (_, rendered) = synthesize(
            "pub fn send(&self, msg: &str) { self._execute_operation(msg); }",
        );

        assert!(rendered.contains("self._execute_async_operation(msg)"));
        assert!(!rendered.contains("self._execute_operation(msg)"));
    }

    #[test]
    fn test_operation_reference_argument_suffixed() {
        let (_, rendered) = synthesize(
            "pub fn send(&self, msg: &str) { self._execute_operation(PgmqOperation::send, msg); }",
        );

        assert!(rendered.contains("PgmqOperation::send_async"));
    }

    #[test]
    fn test_session_calls_become_suspension_points() {
        let (_, rendered) = synthesize(
            r#"
            pub fn create_queue(&self, session: &mut Session, queue: &str) {
                session.execute(queue);
                session.commit();
            }
            "#,
        );

        assert!(rendered.contains("session.execute(queue).await"));
        assert!(rendered.contains("session.commit().await"));
    }

    #[test]
    fn test_session_parameter_type_rewritten() {
        let (_, rendered) =
            synthesize("pub fn purge(&self, session: &mut Session, queue: &str) {}");

        assert!(rendered.contains("session: &mut AsyncSession"));
    }

    #[test]
    fn test_return_call_wrapped_in_await() {
        let rules = RewriteRules {
            dispatch_aliases: std::collections::BTreeMap::from([(
                "helper".to_string(),
                "helper_async".to_string(),
            )]),
            ..RewriteRules::default()
        };
        let synthesizer = Synthesizer::new(rules);
        let twin = synthesizer.synthesize(&record_for(
            "pub fn send(&self, x: i64) -> i64 { return self.helper(x); }",
        ));

        assert!(render(&twin.node).contains("return self.helper_async(x).await;"));
    }

    #[test]
    fn test_non_call_return_left_alone() {
        let (_, rendered) = synthesize("pub fn depth(&self) -> i64 { return 0; }");

        assert!(rendered.contains("return 0;"));
        assert!(!rendered.contains(".await"));
    }

    #[test]
    fn test_tail_call_wrapped_in_await() {
        let (_, rendered) = synthesize("pub fn depth(&self) -> i64 { self.fetch_depth() }");

        assert!(rendered.contains("self.fetch_depth().await"));
    }

    #[test]
    fn test_no_double_await_on_returned_session_call() {
        let (_, rendered) = synthesize(
            "pub fn purge(&self, session: &mut Session) -> u64 { return session.execute(1); }",
        );

        assert!(rendered.contains("session.execute(1).await"));
        assert!(!rendered.contains(".await.await"));
    }

    #[test]
    fn test_doc_example_calls_rewritten() {
        let (_, rendered) = synthesize(
            r#"
            /// Send a message.
            ///
            /// ```ignore
            /// let id = client.send("queue", msg);
            /// ```
            pub fn send(&self, msg: &str) -> i64 { 0 }
            "#,
        );

        assert!(rendered.contains(r#"client.send_async("queue", msg).await"#));
    }

    #[test]
    fn test_doc_sleep_rewritten() {
        let (_, rendered) = synthesize(
            r#"
            /// Polls until visible.
            ///
            /// ```ignore
            /// thread::sleep(Duration::from_secs(1));
            /// ```
            pub fn poll(&self) {}
            "#,
        );

        assert!(rendered.contains("tokio::time::sleep(Duration::from_secs(1)).await"));
    }

    #[test]
    fn test_marker_appended_when_docs_have_none() {
        let (_, rendered) = synthesize(
            r#"
            /// Drops the queue.
            pub fn drop_queue(&self, queue: &str) {}
            "#,
        );

        assert!(rendered.contains("Async variant of [`drop_queue`]."));
    }

    #[test]
    fn test_marker_not_appended_when_rewrite_introduced_one() {
        let (_, rendered) = synthesize(
            r#"
            /// Send a message: `client.send(q, m)`.
            pub fn send(&self, msg: &str) -> i64 { 0 }
            "#,
        );

        // The rewritten example already reads `.await`, so no closing note.
        assert!(!rendered.contains("Async variant of"));
    }

    #[test]
    fn test_undocumented_method_gains_no_docs() {
        let (_, rendered) = synthesize("pub fn archive(&self, id: i64) {}");

        assert!(!rendered.contains("Async variant of"));
    }

    #[test]
    fn test_unrecognized_shapes_pass_through() {
        let (_, rendered) = synthesize(
            r#"
            pub fn metrics(&self) -> u64 {
                let total = 1 + 2;
                total
            }
            "#,
        );

        assert!(rendered.contains("let total = 1 + 2;"));
        assert!(!rendered.contains(".await"));
    }
}
