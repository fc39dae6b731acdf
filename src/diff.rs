//! Line-level unified diff between the original file and the generated
//! artifact.

use crate::report::{GREEN, RED, RESET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Keep,
    Remove,
    Insert,
}

struct Op<'a> {
    kind: Kind,
    a_pos: usize,
    b_pos: usize,
    text: &'a str,
}

/// Render a colored unified diff. Returns an empty string when the inputs
/// are line-identical.
pub fn unified(original: &str, modified: &str, context: usize) -> String {
    unified_with(original, modified, context, true)
}

pub fn unified_with(original: &str, modified: &str, context: usize, color: bool) -> String {
    let a: Vec<&str> = original.lines().collect();
    let b: Vec<&str> = modified.lines().collect();
    let ops = diff_ops(&a, &b);

    let included = mark_context(&ops, context);
    let mut out = String::new();

    let mut i = 0;
    while i < ops.len() {
        if !included[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < ops.len() && included[i] {
            i += 1;
        }
        render_hunk(&mut out, &ops[start..i], color);
    }

    out
}

/// Longest-common-subsequence edit script over lines.
fn diff_ops<'a>(a: &[&'a str], b: &[&'a str]) -> Vec<Op<'a>> {
    let n = a.len();
    let m = b.len();
    let width = m + 1;

    // lcs[i][j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            ops.push(Op { kind: Kind::Keep, a_pos: i, b_pos: j, text: a[i] });
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            ops.push(Op { kind: Kind::Remove, a_pos: i, b_pos: j, text: a[i] });
            i += 1;
        } else {
            ops.push(Op { kind: Kind::Insert, a_pos: i, b_pos: j, text: b[j] });
            j += 1;
        }
    }
    while i < n {
        ops.push(Op { kind: Kind::Remove, a_pos: i, b_pos: j, text: a[i] });
        i += 1;
    }
    while j < m {
        ops.push(Op { kind: Kind::Insert, a_pos: i, b_pos: j, text: b[j] });
        j += 1;
    }
    ops
}

/// Ops within `context` lines of a change are part of a hunk.
fn mark_context(ops: &[Op], context: usize) -> Vec<bool> {
    let mut included = vec![false; ops.len()];
    let mut distance = usize::MAX;

    for (i, op) in ops.iter().enumerate() {
        distance = if op.kind == Kind::Keep {
            distance.saturating_add(1)
        } else {
            0
        };
        included[i] = distance <= context;
    }
    distance = usize::MAX;
    for (i, op) in ops.iter().enumerate().rev() {
        distance = if op.kind == Kind::Keep {
            distance.saturating_add(1)
        } else {
            0
        };
        included[i] = included[i] || distance <= context;
    }
    included
}

fn render_hunk(out: &mut String, hunk: &[Op], color: bool) {
    let a_len = hunk.iter().filter(|op| op.kind != Kind::Insert).count();
    let b_len = hunk.iter().filter(|op| op.kind != Kind::Remove).count();
    let a_start = hunk[0].a_pos + usize::from(a_len > 0);
    let b_start = hunk[0].b_pos + usize::from(b_len > 0);

    out.push_str(&format!("@@ -{a_start},{a_len} +{b_start},{b_len} @@\n"));
    for op in hunk {
        let line = match (op.kind, color) {
            (Kind::Keep, _) => format!(" {}\n", op.text),
            (Kind::Remove, true) => format!("{RED}-{}{RESET}\n", op.text),
            (Kind::Remove, false) => format!("-{}\n", op.text),
            (Kind::Insert, true) => format!("{GREEN}+{}{RESET}\n", op.text),
            (Kind::Insert, false) => format!("+{}\n", op.text),
        };
        out.push_str(&line);
    }
}
