use chrono::NaiveDate;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_LEN: usize = 10;

/// Naming scheme for snapshot files: `<prefix>_<YYYY-MM-DD>.<ext>`, optionally
/// `<prefix>_<YYYY-MM-DD>_<n>.<ext>` when several snapshots share a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPattern {
    prefix: String,
    extension: String,
}

/// A file name that matched the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotName {
    pub date: NaiveDate,
    pub sequence: Option<u32>,
}

impl SnapshotPattern {
    pub fn new(prefix: &str, extension: &str) -> Self {
        SnapshotPattern {
            prefix: prefix.to_string(),
            extension: extension.to_string(),
        }
    }

    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("{}_{}.{}", self.prefix, date.format(DATE_FORMAT), self.extension)
    }

    pub fn file_name_with_sequence(&self, date: NaiveDate, sequence: u32) -> String {
        format!(
            "{}_{}_{}.{}",
            self.prefix,
            date.format(DATE_FORMAT),
            sequence,
            self.extension
        )
    }

    /// Returns the parsed name when the final component of `path` is a snapshot name.
    pub fn matches(&self, path: &Path) -> Option<SnapshotName> {
        let file_name = path.file_name()?.to_str()?;
        self.parse(file_name)
    }

    pub fn parse(&self, file_name: &str) -> Option<SnapshotName> {
        let rest = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('_')?;
        let rest = rest
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;

        if rest.len() < DATE_LEN || !rest.is_char_boundary(DATE_LEN) {
            return None;
        }
        let (date_part, tail) = rest.split_at(DATE_LEN);
        let date = parse_strict_date(date_part)?;

        let sequence = match tail {
            "" => None,
            _ => {
                let digits = tail.strip_prefix('_')?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                Some(digits.parse().ok()?)
            }
        };

        Some(SnapshotName { date, sequence })
    }
}

/// Only zero-padded `YYYY-MM-DD`; chrono alone would also take `2024-1-5`.
fn parse_strict_date(value: &str) -> Option<NaiveDate> {
    let shape_ok = value.bytes().enumerate().all(|(idx, b)| match idx {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_file_name_is_zero_padded() {
        let pattern = SnapshotPattern::new("friends", "db");
        assert_eq!(pattern.file_name(date(2024, 3, 7)), "friends_2024-03-07.db");
        assert_eq!(
            pattern.file_name_with_sequence(date(2024, 3, 7), 2),
            "friends_2024-03-07_2.db"
        );
    }

    #[test]
    fn test_parses_generated_names() {
        let pattern = SnapshotPattern::new("friends", "db");

        assert_eq!(
            pattern.parse("friends_2024-03-07.db"),
            Some(SnapshotName {
                date: date(2024, 3, 7),
                sequence: None
            })
        );
        assert_eq!(
            pattern.parse("friends_2024-03-07_12.db"),
            Some(SnapshotName {
                date: date(2024, 3, 7),
                sequence: Some(12)
            })
        );
    }

    #[test]
    fn test_rejects_unrelated_files() {
        let pattern = SnapshotPattern::new("friends", "db");

        let unrelated = [
            "friends.db",
            "friends_latest.db",
            "friends_2024-03-07.db-journal",
            "friends_2024-03-07.sqlite",
            "friends_2024-3-7.db",
            "friends_2024-02-30.db",
            "friends_2024-03-07_.db",
            "friends_2024-03-07_x1.db",
            "friends_2024-03-07-copy.db",
            "other_2024-03-07.db",
            ".friends_2024-03-07.db.partial",
            "notes.txt",
        ];
        for name in unrelated {
            assert_eq!(pattern.parse(name), None, "{} should not match", name);
        }
    }

    #[test]
    fn test_prefix_containing_underscore() {
        let pattern = SnapshotPattern::new("friends_db", "sqlite3");
        assert!(pattern.parse("friends_db_2024-12-31.sqlite3").is_some());
        assert!(pattern.parse("friends_2024-12-31.sqlite3").is_none());
    }

    #[test]
    fn test_matches_uses_final_component() {
        let pattern = SnapshotPattern::new("backup", "db");
        assert!(pattern
            .matches(Path::new("/var/backups/backup_2024-01-01.db"))
            .is_some());
        assert!(pattern
            .matches(Path::new("/var/backup_2024-01-01.db/other"))
            .is_none());
    }
}
