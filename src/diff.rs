//! Line-level unified diffs between two snapshots of page text.

/// Lines of unchanged context printed around each change.
pub const DEFAULT_CONTEXT: usize = 3;

/// Above this many LCS table cells the changed middle is reported as one
/// block replacement instead of a minimal edit script.
const MAX_TABLE_CELLS: usize = 1 << 22;

const OLD_HEADER: &str = "--- previous";
const NEW_HEADER: &str = "+++ current";
/// Follows a printed line that has no terminating newline.
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Delete,
    Insert,
}

#[derive(Debug, Clone, Copy)]
struct Op {
    tag: Tag,
    old: usize,
    new: usize,
}

/// Diffs `old` against `new` line by line.
///
/// The output starts with `--- previous` / `+++ current` headers followed by
/// `@@` hunks whose lines are prefixed with a space (context), `-` (removed)
/// or `+` (added). A printed line without a trailing newline is followed by
/// [`NO_NEWLINE_MARKER`], so texts differing only in their line endings still
/// produce a diff. Identical inputs produce an empty vector.
pub fn unified_diff(old: &str, new: &str, context: usize) -> Vec<String> {
    let a: Vec<&str> = old.split_inclusive('\n').collect();
    let b: Vec<&str> = new.split_inclusive('\n').collect();
    let ops = diff_ops(&a, &b);

    let mut out = Vec::new();
    for (lo, hi) in hunk_bounds(&ops, context) {
        if out.is_empty() {
            out.push(OLD_HEADER.to_string());
            out.push(NEW_HEADER.to_string());
        }
        let hunk = &ops[lo..hi];
        let old_len = hunk.iter().filter(|op| op.tag != Tag::Insert).count();
        let new_len = hunk.iter().filter(|op| op.tag != Tag::Delete).count();
        out.push(format!(
            "@@ -{} +{} @@",
            format_range(hunk[0].old, old_len),
            format_range(hunk[0].new, new_len)
        ));

        for op in hunk {
            let (prefix, line) = match op.tag {
                Tag::Equal => (' ', a[op.old]),
                Tag::Delete => ('-', a[op.old]),
                Tag::Insert => ('+', b[op.new]),
            };
            match line.strip_suffix('\n') {
                Some(text) => out.push(format!("{prefix}{text}")),
                None => {
                    out.push(format!("{prefix}{line}"));
                    out.push(NO_NEWLINE_MARKER.to_string());
                }
            }
        }
    }
    out
}

/// Applies a diff produced by [`unified_diff`] to `old`.
///
/// Returns `None` if a hunk header is malformed or the context and removed
/// lines do not match `old`.
pub fn apply(old: &str, diff: &[String]) -> Option<String> {
    let source: Vec<&str> = old.split_inclusive('\n').collect();
    let mut result = String::with_capacity(old.len());
    let mut cursor = 0;
    let mut lines = diff.iter().peekable();

    while let Some(line) = lines.next() {
        if line == OLD_HEADER || line == NEW_HEADER {
            continue;
        }
        if let Some(header) = line.strip_prefix("@@ -") {
            let (start, len) = parse_range(header.split(' ').next()?)?;
            // A zero-length range names the line *before* the insertion point.
            let begin = if len == 0 { start } else { start.checked_sub(1)? };
            if begin < cursor || begin > source.len() {
                return None;
            }
            source[cursor..begin].iter().for_each(|l| result.push_str(l));
            cursor = begin;
            continue;
        }

        let mut chars = line.chars();
        let prefix = chars.next()?;
        let mut full = chars.as_str().to_string();
        if lines.next_if(|next| *next == NO_NEWLINE_MARKER).is_none() {
            full.push('\n');
        }
        match prefix {
            ' ' | '-' => {
                if source.get(cursor) != Some(&full.as_str()) {
                    return None;
                }
                if prefix == ' ' {
                    result.push_str(&full);
                }
                cursor += 1;
            }
            '+' => result.push_str(&full),
            _ => return None,
        }
    }

    source.get(cursor..)?.iter().for_each(|l| result.push_str(l));
    Some(result)
}

/// Longest-common-subsequence edit script. Common prefix and suffix are
/// peeled off first so the quadratic table only covers the changed middle;
/// a middle too large for the table is replaced wholesale.
fn diff_ops(a: &[&str], b: &[&str]) -> Vec<Op> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];

    let mut tags = vec![Tag::Equal; prefix];
    match (mid_a.len() + 1).checked_mul(mid_b.len() + 1) {
        Some(cells) if cells <= MAX_TABLE_CELLS => lcs_tags(mid_a, mid_b, &mut tags),
        _ => {
            tags.extend(std::iter::repeat_n(Tag::Delete, mid_a.len()));
            tags.extend(std::iter::repeat_n(Tag::Insert, mid_b.len()));
        }
    }
    tags.extend(std::iter::repeat_n(Tag::Equal, suffix));

    let (mut old, mut new) = (0, 0);
    tags.into_iter()
        .map(|tag| {
            let op = Op { tag, old, new };
            match tag {
                Tag::Equal => {
                    old += 1;
                    new += 1;
                }
                Tag::Delete => old += 1,
                Tag::Insert => new += 1,
            }
            op
        })
        .collect()
}

/// Appends the LCS edit script of `a` and `b` to `tags`, removals ahead of
/// additions within each change block.
fn lcs_tags(a: &[&str], b: &[&str], tags: &mut Vec<Tag>) {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
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

    let (mut i, mut j) = (0, 0);
    let (mut deletes, mut inserts) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && a[i] == b[j] {
            tags.extend(std::iter::repeat_n(Tag::Delete, deletes));
            tags.extend(std::iter::repeat_n(Tag::Insert, inserts));
            (deletes, inserts) = (0, 0);
            tags.push(Tag::Equal);
            i += 1;
            j += 1;
        } else if j == m || (i < n && lcs[(i + 1) * width + j] >= lcs[i * width + j + 1]) {
            deletes += 1;
            i += 1;
        } else {
            inserts += 1;
            j += 1;
        }
    }
    tags.extend(std::iter::repeat_n(Tag::Delete, deletes));
    tags.extend(std::iter::repeat_n(Tag::Insert, inserts));
}

/// Half-open `ops` index ranges of each hunk, changes padded with `context`
/// equal lines and merged when their padding would overlap.
fn hunk_bounds(ops: &[Op], context: usize) -> Vec<(usize, usize)> {
    let mut bounds: Vec<(usize, usize)> = Vec::new();
    let mut idx = 0;
    while idx < ops.len() {
        if ops[idx].tag == Tag::Equal {
            idx += 1;
            continue;
        }
        let start = idx;
        while idx < ops.len() && ops[idx].tag != Tag::Equal {
            idx += 1;
        }
        let lo = start.saturating_sub(context);
        let hi = (idx + context).min(ops.len());
        match bounds.last_mut() {
            Some(last) if lo <= last.1 => last.1 = hi,
            _ => bounds.push((lo, hi)),
        }
    }
    bounds
}

/// Ranges are 1-based; an empty range points at the preceding line.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}
