use tracing::debug;

use super::types::{Change, ChangeKind, Chunk, DiffFile};

const DEV_NULL: &str = "/dev/null";

/// Parse a unified diff string into a vector of DiffFile structs.
///
/// The input is the raw text from GitHub's diff endpoint, but plain
/// `diff -u` output without `diff --git` headers is accepted too.
///
/// Each git file section starts with:
///   diff --git a/{path} b/{path}
///
/// New files have `new file mode` and/or `--- /dev/null`.
/// Deleted files have `deleted file mode` and/or `+++ /dev/null`.
///
/// Hunks start with: @@ -{old_start},{old_count} +{new_start},{new_count} @@
/// and their body is consumed by those counts, so a removed line that
/// happens to start with `-- ` never reads as a file header.
///
/// Parsing never fails: text that is not a diff yields no files and an
/// unreadable hunk header drops that hunk.
pub fn parse_diff(raw_diff: &str) -> Vec<DiffFile> {
    let mut parser = DiffParser::default();
    for line in raw_diff.lines() {
        parser.feed(line);
    }
    parser.finish()
}

#[derive(Default)]
struct DiffParser {
    files: Vec<DiffFile>,
    file: Option<DiffFile>,
    chunk: Option<Chunk>,
    old_remaining: usize,
    new_remaining: usize,
    new_line: usize,
}

impl DiffParser {
    fn feed(&mut self, line: &str) {
        if self.in_hunk() {
            if self.push_change(line) {
                return;
            }
            self.finish_chunk();
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            self.start_file();
            if let (Some(file), Some((from, to))) = (self.file.as_mut(), split_git_header(rest)) {
                file.from = from;
                file.to = to;
            }
        } else if line.starts_with("@@") {
            self.start_chunk(line);
        } else if let Some(path) = line.strip_prefix("--- ") {
            if !matches!(&self.file, Some(file) if file.chunks.is_empty()) {
                self.start_file();
            }
            let path = header_path(path, "a/");
            if let Some(file) = self.file.as_mut() {
                file.is_new |= path == DEV_NULL;
                file.from = path;
            }
        } else if let Some(path) = line.strip_prefix("+++ ") {
            if self.file.is_none() {
                self.start_file();
            }
            let path = header_path(path, "b/");
            if let Some(file) = self.file.as_mut() {
                file.is_deleted |= path == DEV_NULL;
                file.to = path;
            }
        } else if let Some(file) = self.file.as_mut() {
            if line.starts_with("new file mode") {
                file.is_new = true;
            } else if line.starts_with("deleted file mode") {
                file.is_deleted = true;
            } else if let Some(path) = line.strip_prefix("rename from ") {
                file.from = unquote(path).to_string();
            } else if let Some(path) = line.strip_prefix("rename to ") {
                file.to = unquote(path).to_string();
            }
        }
    }

    fn in_hunk(&self) -> bool {
        self.chunk.is_some() && (self.old_remaining > 0 || self.new_remaining > 0)
    }

    /// Record one hunk body line. Returns false when the line cannot
    /// belong to a hunk, which ends the current one.
    fn push_change(&mut self, line: &str) -> bool {
        let kind = match line.as_bytes().first() {
            Some(b'+') => ChangeKind::Add,
            Some(b'-') => ChangeKind::Delete,
            // Some tools strip the lone space from empty context lines.
            Some(b' ') | None => ChangeKind::Normal,
            Some(b'\\') => return true,
            Some(_) => return false,
        };
        let (Some(file), Some(chunk)) = (self.file.as_mut(), self.chunk.as_mut()) else {
            return false;
        };

        let new_line = match kind {
            ChangeKind::Add => {
                file.additions += 1;
                self.new_remaining = self.new_remaining.saturating_sub(1);
                Some(next_line(&mut self.new_line))
            }
            ChangeKind::Delete => {
                file.deletions += 1;
                self.old_remaining = self.old_remaining.saturating_sub(1);
                None
            }
            ChangeKind::Normal => {
                self.old_remaining = self.old_remaining.saturating_sub(1);
                self.new_remaining = self.new_remaining.saturating_sub(1);
                Some(next_line(&mut self.new_line))
            }
        };
        chunk.changes.push(Change {
            kind,
            content: line.to_string(),
            new_line,
        });

        if !self.in_hunk() {
            self.finish_chunk();
        }
        true
    }

    fn start_file(&mut self) {
        self.finish_file();
        self.file = Some(DiffFile::default());
    }

    fn start_chunk(&mut self, line: &str) {
        self.finish_chunk();
        if self.file.is_none() {
            debug!(header = line, "hunk header outside of a file section, skipping");
            return;
        }
        let Some(((_, old_lines), (new_start, new_lines))) = parse_hunk_header(line) else {
            debug!(header = line, "unreadable hunk header, skipping hunk");
            return;
        };
        self.old_remaining = old_lines;
        self.new_remaining = new_lines;
        self.new_line = new_start;
        self.chunk = Some(Chunk {
            header: line.to_string(),
            changes: Vec::new(),
        });
        if !self.in_hunk() {
            self.finish_chunk();
        }
    }

    fn finish_chunk(&mut self) {
        self.old_remaining = 0;
        self.new_remaining = 0;
        if let (Some(file), Some(chunk)) = (self.file.as_mut(), self.chunk.take()) {
            file.chunks.push(chunk);
        }
    }

    fn finish_file(&mut self) {
        self.finish_chunk();
        if let Some(file) = self.file.take() {
            self.files.push(file);
        }
    }

    fn finish(mut self) -> Vec<DiffFile> {
        self.finish_file();
        self.files
    }
}

/// Current line number, advancing the counter. Saturates instead of
/// wrapping on absurd hunk starts.
fn next_line(counter: &mut usize) -> usize {
    let line = *counter;
    *counter = counter.saturating_add(1);
    line
}

/// Split the `a/{from} b/{to}` part of a `diff --git` line.
fn split_git_header(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim();
    if let Some(stripped) = rest.strip_prefix('"') {
        // "a/with space" "b/with space"
        let (from, to) = stripped.split_once("\" \"")?;
        let to = to.strip_suffix('"').unwrap_or(to);
        return Some((strip_side(from, "a/"), strip_side(to, "b/")));
    }
    let (from, to) = rest.split_once(" b/")?;
    Some((strip_side(from, "a/"), to.to_string()))
}

/// Path from a `---`/`+++` line, without a trailing timestamp.
fn header_path(raw: &str, side: &str) -> String {
    let raw = raw.split('\t').next().unwrap_or(raw).trim_end();
    let raw = unquote(raw);
    if raw == DEV_NULL {
        return raw.to_string();
    }
    strip_side(raw, side)
}

fn strip_side(path: &str, side: &str) -> String {
    path.strip_prefix(side).unwrap_or(path).to_string()
}

fn unquote(path: &str) -> &str {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}

type Range = (usize, usize);

fn parse_hunk_header(line: &str) -> Option<(Range, Range)> {
    let header = line.strip_prefix("@@ ")?;
    let (ranges, _section) = header.split_once(" @@")?;
    let mut parts = ranges.split_whitespace();
    let old = parse_range(parts.next()?, '-')?;
    let new = parse_range(parts.next()?, '+')?;
    if parts.next().is_some() {
        return None;
    }
    Some((old, new))
}

fn parse_range(part: &str, prefix: char) -> Option<Range> {
    let range = part.strip_prefix(prefix)?;
    let (start, count) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    let start: usize = start.parse().ok()?;
    let count: usize = count.parse().ok()?;
    // A range running past the end of the line space is not a real hunk.
    start.checked_add(count)?;
    Some((start, count))
}
