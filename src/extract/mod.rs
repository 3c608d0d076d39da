pub mod filter;

pub use filter::ScanFilter;

use regex::Regex;
use tracing::debug;

use crate::pr::types::{Change, Chunk, DiffFile};

/// The first added line that matched the pattern.
#[derive(Debug, Clone, Copy)]
pub struct Capture<'a> {
    pub file: &'a DiffFile,
    pub chunk: &'a Chunk,
    pub change: &'a Change,
    /// Text of capture group 1. `None` when the pattern has no group or
    /// the group did not take part in the match.
    pub content: Option<&'a str>,
}

/// Every added line of the in-scope files, in file -> chunk -> line order.
pub fn added_lines<'a, 'f>(
    files: &'a [DiffFile],
    filter: &'f ScanFilter,
) -> impl Iterator<Item = (&'a DiffFile, &'a Chunk, &'a Change)> + 'f
where
    'a: 'f,
{
    files
        .iter()
        .filter(move |file| filter.admits(file))
        .flat_map(|file| {
            file.chunks.iter().flat_map(move |chunk| {
                chunk
                    .changes
                    .iter()
                    .filter(|change| change.is_add())
                    .map(move |change| (file, chunk, change))
            })
        })
}

/// Find the first added line the pattern matches. Scanning stops at that
/// line even when it carries no usable group.
pub fn find_capture<'a>(
    files: &'a [DiffFile],
    pattern: &Regex,
    filter: &ScanFilter,
) -> Option<Capture<'a>> {
    added_lines(files, filter).find_map(|(file, chunk, change)| {
        pattern.captures(&change.content).map(|caps| Capture {
            file,
            chunk,
            change,
            content: caps.get(1).map(|group| group.as_str()),
        })
    })
}

/// Capture group 1 of the first match, or the empty string.
pub fn extract(files: &[DiffFile], pattern: &Regex, filter: &ScanFilter) -> String {
    let Some(capture) = find_capture(files, pattern, filter) else {
        debug!(files = files.len(), "no added line matched");
        return String::new();
    };
    debug!(
        path = %capture.file.to,
        chunk = %capture.chunk.header,
        line = capture.change.new_line,
        has_group = capture.content.is_some(),
        "pattern matched added line"
    );
    capture.content.unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::diff::parse_diff;
    use crate::pr::types::{ChangeKind, Chunk};

    const SAMPLE_DIFF: &str = include_str!("../../tests/fixtures/sample_diff.patch");

    fn change(kind: ChangeKind, content: &str) -> Change {
        Change {
            kind,
            content: content.to_string(),
            new_line: None,
        }
    }

    fn test_diff_file(to: &str, is_new: bool, changes: Vec<Change>) -> DiffFile {
        DiffFile {
            from: if is_new { "/dev/null".to_string() } else { to.to_string() },
            to: to.to_string(),
            is_new,
            chunks: vec![Chunk {
                changes,
                ..Chunk::default()
            }],
            ..DiffFile::default()
        }
    }

    fn token_diff() -> Vec<DiffFile> {
        vec![test_diff_file(
            "src/foo.ts",
            true,
            vec![change(ChangeKind::Add, "+ token: ABC123")],
        )]
    }

    fn regex(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    #[test]
    fn test_token_in_new_file() {
        let filter = ScanFilter::new(true, None);
        assert_eq!(extract(&token_diff(), &regex(r"token: (\w+)"), &filter), "ABC123");
    }

    #[test]
    fn test_token_outside_prefix() {
        let filter = ScanFilter::new(true, Some("docs/".to_string()));
        assert_eq!(extract(&token_diff(), &regex(r"token: (\w+)"), &filter), "");
    }

    #[test]
    fn test_no_added_lines() {
        let files = vec![test_diff_file(
            "src/a.rs",
            false,
            vec![
                change(ChangeKind::Delete, "-token: OLD"),
                change(ChangeKind::Normal, " token: SAME"),
            ],
        )];
        assert_eq!(extract(&files, &regex(r"token: (\w+)"), &ScanFilter::default()), "");
        assert_eq!(extract(&[], &regex(r"(.*)"), &ScanFilter::default()), "");
    }

    #[test]
    fn test_first_match_in_document_order_wins() {
        let files = vec![
            test_diff_file(
                "a.txt",
                false,
                vec![
                    change(ChangeKind::Add, "+nothing here"),
                    change(ChangeKind::Add, "+id=first"),
                    change(ChangeKind::Add, "+id=second"),
                ],
            ),
            test_diff_file("b.txt", false, vec![change(ChangeKind::Add, "+id=third")]),
        ];
        assert_eq!(extract(&files, &regex(r"id=(\w+)"), &ScanFilter::default()), "first");
    }

    #[test]
    fn test_chunk_order_within_a_file() {
        let mut file = test_diff_file("a.txt", false, vec![change(ChangeKind::Add, "+v=1")]);
        file.chunks.push(Chunk {
            changes: vec![change(ChangeKind::Add, "+v=2")],
            ..Chunk::default()
        });
        assert_eq!(extract(&[file], &regex(r"v=(\d)"), &ScanFilter::default()), "1");
    }

    #[test]
    fn test_new_files_only_excludes_matching_modified_file() {
        let files = vec![
            test_diff_file("old.txt", false, vec![change(ChangeKind::Add, "+id=modified")]),
            test_diff_file("new.txt", true, vec![change(ChangeKind::Add, "+id=created")]),
        ];
        let pattern = regex(r"id=(\w+)");
        assert_eq!(extract(&files, &pattern, &ScanFilter::default()), "modified");
        assert_eq!(extract(&files, &pattern, &ScanFilter::new(true, None)), "created");
    }

    #[test]
    fn test_match_without_group_stops_with_empty_result() {
        let files = vec![test_diff_file(
            "a.txt",
            false,
            vec![
                change(ChangeKind::Add, "+token"),
                change(ChangeKind::Add, "+token: LATER"),
            ],
        )];
        let capture = find_capture(&files, &regex("token"), &ScanFilter::default()).unwrap();
        assert_eq!(capture.change.content, "+token");
        assert_eq!(capture.content, None);
        assert_eq!(extract(&files, &regex("token"), &ScanFilter::default()), "");
    }

    #[test]
    fn test_optional_group_that_did_not_participate() {
        let files = vec![test_diff_file("a.txt", false, vec![change(ChangeKind::Add, "+key")])];
        assert_eq!(extract(&files, &regex(r"key(=\w+)?"), &ScanFilter::default()), "");
    }

    #[test]
    fn test_pattern_sees_leading_marker() {
        let files = vec![test_diff_file("a.txt", false, vec![change(ChangeKind::Add, "+value")])];
        assert_eq!(extract(&files, &regex(r"^\+(\w+)$"), &ScanFilter::default()), "value");
    }

    #[test]
    fn test_added_lines_skips_filtered_files() {
        let files = parse_diff(SAMPLE_DIFF);
        let filter = ScanFilter::new(false, Some("src/".to_string()));
        let lines: Vec<(&str, &str)> = added_lines(&files, &filter)
            .map(|(file, _, change)| (file.to.as_str(), change.content.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("src/config.ts", "+  release: \"1.5.0\","),
                ("src/config.ts", "+  channel: \"beta\","),
                ("src/new_name.ts", "+  // release-id: REL-2042"),
            ]
        );
    }

    #[test]
    fn test_fixture_scan() {
        let files = parse_diff(SAMPLE_DIFF);
        let pattern = regex(r"release-id: (REL-\d+)");

        assert_eq!(extract(&files, &pattern, &ScanFilter::default()), "REL-2041");
        assert_eq!(
            extract(&files, &pattern, &ScanFilter::new(false, Some("src/".to_string()))),
            "REL-2042"
        );
        assert_eq!(
            extract(&files, &pattern, &ScanFilter::new(true, Some("src/".to_string()))),
            ""
        );

        let capture = find_capture(&files, &pattern, &ScanFilter::default()).unwrap();
        assert_eq!(capture.file.to, "docs/releases/1.5.0.md");
        assert_eq!(capture.change.new_line, Some(3));
    }

    #[test]
    fn test_extract_does_not_touch_input() {
        let files = token_diff();
        let before = format!("{files:?}");
        extract(&files, &regex(r"token: (\w+)"), &ScanFilter::default());
        assert_eq!(format!("{files:?}"), before);
    }
}
