use crate::pr::DiffFile;

/// Which files of the diff are in scope for extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    /// Only scan files created by the pull request
    pub new_files_only: bool,
    /// Literal, case-sensitive prefix of the destination path
    pub path_prefix: Option<String>,
}

impl ScanFilter {
    pub fn new(new_files_only: bool, path_prefix: Option<String>) -> Self {
        Self {
            new_files_only,
            path_prefix: path_prefix.filter(|prefix| !prefix.is_empty()),
        }
    }

    pub fn admits(&self, file: &DiffFile) -> bool {
        if self.new_files_only && !file.is_new {
            return false;
        }
        match &self.path_prefix {
            Some(prefix) => file.to.starts_with(prefix.as_str()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(to: &str, is_new: bool) -> DiffFile {
        DiffFile {
            to: to.to_string(),
            is_new,
            ..DiffFile::default()
        }
    }

    #[test]
    fn test_default_admits_everything() {
        let filter = ScanFilter::default();
        assert!(filter.admits(&file("src/a.rs", false)));
        assert!(filter.admits(&file("src/b.rs", true)));
    }

    #[test]
    fn test_new_files_only() {
        let filter = ScanFilter::new(true, None);
        assert!(filter.admits(&file("src/a.rs", true)));
        assert!(!filter.admits(&file("src/a.rs", false)));
    }

    #[test]
    fn test_path_prefix_is_literal_and_case_sensitive() {
        let filter = ScanFilter::new(false, Some("docs/".to_string()));
        assert!(filter.admits(&file("docs/guide.md", false)));
        assert!(!filter.admits(&file("Docs/guide.md", false)));
        assert!(!filter.admits(&file("src/docs/guide.md", false)));

        let glob = ScanFilter::new(false, Some("docs/*".to_string()));
        assert!(!glob.admits(&file("docs/guide.md", false)));
    }

    #[test]
    fn test_empty_prefix_means_no_filter() {
        let filter = ScanFilter::new(false, Some(String::new()));
        assert_eq!(filter.path_prefix, None);
        assert!(filter.admits(&file("anything", false)));
    }

    #[test]
    fn test_both_filters_apply() {
        let filter = ScanFilter::new(true, Some("migrations/".to_string()));
        assert!(filter.admits(&file("migrations/001.sql", true)));
        assert!(!filter.admits(&file("migrations/001.sql", false)));
        assert!(!filter.admits(&file("src/001.sql", true)));
    }
}
