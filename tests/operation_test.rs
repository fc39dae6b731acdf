use std::collections::BTreeSet;

use twingen::scan::scan;
use twingen::{rebuild, RewriteRules, SourceTree, Synthesizer};

/// The operation layer exposes associated functions that take the session
/// as an explicit parameter instead of holding one.
const OPERATION_SOURCE: &str = r#"
impl PgmqOperation {
    fn _create_statement(queue: &str) -> String {
        format!("select pgmq.create('{queue}');")
    }

    /// Create a new queue using the provided session.
    pub fn create_queue(session: &mut Session, queue: &str) {
        session.execute(Self::_create_statement(queue));
        session.commit();
    }

    /// Queue depth at the time of the call.
    pub fn depth(session: &mut Session, queue: &str) -> i64 {
        session.execute(queue)
    }

    pub fn validate_queue_name(queue: &str) -> bool {
        !queue.is_empty()
    }
}
"#;

#[test]
fn test_static_methods_are_scanned_like_instance_methods() {
    let rules = RewriteRules::default();
    let tree = SourceTree::parse(OPERATION_SOURCE).unwrap();

    let scan_result = scan(&tree, "PgmqOperation", &rules);

    assert_eq!(
        scan_result.missing,
        BTreeSet::from([
            "create_queue".to_string(),
            "depth".to_string(),
            "validate_queue_name".to_string(),
        ])
    );
}

#[test]
fn test_session_parameter_and_calls_rewritten_for_static_methods() {
    let rules = RewriteRules::default();
    let tree = SourceTree::parse(OPERATION_SOURCE).unwrap();
    let scan_result = scan(&tree, "PgmqOperation", &rules);
    let synthesized = Synthesizer::new(rules.clone()).synthesize_all(&scan_result);
    let rebuilt = rebuild(&tree, "PgmqOperation", synthesized);
    let source = rebuilt.to_source();

    assert!(source.contains("pub async fn create_queue_async(session: &mut AsyncSession, queue: &str)"));
    assert!(source.contains("session.execute(Self::_create_statement(queue)).await"));
    assert!(source.contains("session.commit().await"));
    assert!(scan(&rebuilt, "PgmqOperation", &rules).is_complete());
}

#[test]
fn test_tail_session_call_awaited_once() {
    let rules = RewriteRules::default();
    let tree = SourceTree::parse(OPERATION_SOURCE).unwrap();
    let scan_result = scan(&tree, "PgmqOperation", &rules);
    let synthesized = Synthesizer::new(rules).synthesize_all(&scan_result);
    let rebuilt = rebuild(&tree, "PgmqOperation", synthesized);
    let source = rebuilt.to_source();

    assert!(source.contains("session.execute(queue).await"));
    assert!(!source.contains(".await.await"));
}

#[test]
fn test_pure_helper_gains_async_shell_only() {
    // validate_queue_name has nothing to rewrite; its twin is just the
    // renamed async signature with the same body.
    let rules = RewriteRules::default();
    let tree = SourceTree::parse(OPERATION_SOURCE).unwrap();
    let scan_result = scan(&tree, "PgmqOperation", &rules);
    let synthesized = Synthesizer::new(rules).synthesize_all(&scan_result);
    let rebuilt = rebuild(&tree, "PgmqOperation", synthesized);
    let source = rebuilt.to_source();

    assert!(source.contains("pub async fn validate_queue_name_async(queue: &str) -> bool"));
    assert!(source.contains("!queue.is_empty()"));
}
