/// A single file within the pull request diff.
/// Populated by the diff parser in diff.rs, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DiffFile {
    /// Path before the change (`/dev/null` for created files)
    pub from: String,
    /// Path after the change (`/dev/null` for deleted files)
    pub to: String,
    /// Whether this file is created by the pull request
    pub is_new: bool,
    /// Whether this file is deleted by the pull request
    pub is_deleted: bool,
    /// Lines added in this file
    pub additions: usize,
    /// Lines deleted in this file
    pub deletions: usize,
    /// Chunks in the order they appear in the diff
    pub chunks: Vec<Chunk>,
}

/// A contiguous region of changes within a file.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// The raw `@@ -{old} +{new} @@` header line
    pub header: String,
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Delete,
    /// Unchanged context line
    Normal,
}

/// One line of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    /// Line text including its leading `+`, `-` or space marker
    pub content: String,
    /// Line number on the new side (absent for deletions)
    pub new_line: Option<usize>,
}

impl Change {
    pub fn is_add(&self) -> bool {
        self.kind == ChangeKind::Add
    }
}
