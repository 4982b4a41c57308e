//! Flat `option=value` configuration file parser.
//!
//! This is the on-disk format shared by the defaults file, the per-user rc
//! file and the per-theme override files (`themerc`, `keythemerc`). The
//! parser returns pairs in file order; callers apply them in order so a
//! later line for the same option wins.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Read and parse a flat rc file.
///
/// Returns `None` when the file cannot be read at all (the caller decides
/// whether that is fatal). Malformed lines are skipped with a warning.
pub fn parse_file(path: &Path) -> Option<Vec<(String, String)>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "rc file not readable");
            return None;
        }
    };
    Some(parse_str(&contents, path))
}

fn parse_str(contents: &str, path: &Path) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (lineno, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((option, value)) if !option.trim().is_empty() => {
                pairs.push((option.trim().to_string(), value.trim().to_string()));
            }
            _ => {
                warn!(
                    path = %path.display(),
                    line = lineno + 1,
                    content = %line,
                    "skipping malformed rc line"
                );
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(contents: &str) -> Vec<(String, String)> {
        parse_str(contents, Path::new("test.rc"))
    }

    #[test]
    fn parses_pairs_in_file_order() {
        let pairs = parse("theme=Default\nsnap_width=10\n");
        assert_eq!(
            pairs,
            vec![
                ("theme".to_string(), "Default".to_string()),
                ("snap_width".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let pairs = parse("# a comment\n\n   \ntheme=Default\n");
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn trims_whitespace_around_option_and_value() {
        let pairs = parse("  raise_delay =  250  \n");
        assert_eq!(pairs[0], ("raise_delay".to_string(), "250".to_string()));
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let pairs = parse("title_font=Sans=ish 10\n");
        assert_eq!(pairs[0].1, "Sans=ish 10");
    }

    #[test]
    fn empty_value_is_kept() {
        let pairs = parse("keytheme=\n");
        assert_eq!(pairs[0], ("keytheme".to_string(), String::new()));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let pairs = parse("not a pair\n=value\ntheme=Default\n");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "theme");
    }

    #[test]
    fn duplicate_options_keep_both_entries_in_order() {
        // Later lines win once applied to a resolution table.
        let pairs = parse("theme=First\ntheme=Second\n");
        assert_eq!(pairs[0].1, "First");
        assert_eq!(pairs[1].1, "Second");
    }

    #[test]
    fn missing_file_returns_none() {
        assert!(parse_file(Path::new("/nonexistent/rfwm-test.rc")).is_none());
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rc");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "snap_to_border=true").unwrap();
        let pairs = parse_file(&path).unwrap();
        assert_eq!(pairs[0], ("snap_to_border".to_string(), "true".to_string()));
    }
}
