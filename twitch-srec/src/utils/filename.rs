//! Recording filename construction.
//!
//! Recordings are named `<timestamp> - <target> - <title>.<ext>`. Titles are
//! free text from the platform, so the whole name goes through
//! [`sanitize_filename`] which keeps only alphanumerics (any script) and the
//! four separators ` `, `-`, `_`, `.`. Everything else is dropped rather than
//! replaced.

use chrono::{DateTime, TimeZone};

/// Timestamp prefix format, e.g. `2024-01-01 12h00m00s`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %Hh%Mm%Ss";

/// Longest file name most filesystems accept, in bytes.
pub const MAX_FILENAME_BYTES: usize = 255;

const KEPT_SEPARATORS: &[char] = &[' ', '-', '_', '.'];

/// Drop every character that is not alphanumeric or a kept separator.
///
/// # Examples
///
/// ```
/// use twitch_srec::utils::filename::sanitize_filename;
///
/// assert_eq!(
///     sanitize_filename("2024-01-01 12h00m00s - Alice! - Big Win???.mp4"),
///     "2024-01-01 12h00m00s - Alice - Big Win.mp4"
/// );
/// ```
pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric() || KEPT_SEPARATORS.contains(c))
        .collect()
}

/// Build the sanitized recording filename for a session discovered at `at`.
///
/// The title is cut on a char boundary so the whole name stays within
/// [`MAX_FILENAME_BYTES`].
pub fn recording_filename<Tz>(at: &DateTime<Tz>, target: &str, title: &str, ext: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let prefix = sanitize_filename(&format!("{} - {} - ", at.format(TIMESTAMP_FORMAT), target));
    let suffix = sanitize_filename(&format!(".{ext}"));
    let title = sanitize_filename(title);
    let budget = MAX_FILENAME_BYTES.saturating_sub(prefix.len() + suffix.len());
    format!("{prefix}{}{suffix}", truncate_on_char_boundary(&title, budget))
}

/// Longest prefix of `s` that is at most `max_bytes` long.
fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    #[test]
    fn test_reference_example() {
        assert_eq!(
            sanitize_filename("2024-01-01 12h00m00s - Alice! - Big Win???.mp4"),
            "2024-01-01 12h00m00s - Alice - Big Win.mp4"
        );
    }

    #[test]
    fn test_reserved_characters_dropped() {
        assert_eq!(sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#), "abcdefghij");
    }

    #[test]
    fn test_multibyte_punctuation_dropped() {
        assert_eq!(sanitize_filename("观看「青蛙」！"), "观看青蛙");
        assert_eq!(sanitize_filename("Ünïcödé — ok…"), "Ünïcödé  ok");
    }

    #[test]
    fn test_emoji_dropped() {
        assert_eq!(sanitize_filename("gg 🎉 wp"), "gg  wp");
    }

    #[test]
    fn test_idempotency() {
        let inputs = [
            "hello?world",
            "观看一只青蛙?",
            "  test  ",
            "...dots...",
            "2024-01-01 12h00m00s - Alice! - Big Win???.mp4",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            let twice = sanitize_filename(&once);
            assert_eq!(once, twice, "Idempotency failed for input: {}", input);
        }
    }

    #[test]
    fn test_recording_filename() {
        let at = FixedOffset::east_opt(0)
            .unwrap()
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            recording_filename(&at, "Alice", "Speedrun!!", "mp4"),
            "2024-01-01 12h00m00s - Alice - Speedrun.mp4"
        );
    }

    #[test]
    fn test_long_multibyte_title_fits_filesystem_limit() {
        let at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .unwrap();
        let title = "한".repeat(140);
        let name = recording_filename(&at, "alice", &title, "mp4");

        assert!(name.len() <= MAX_FILENAME_BYTES, "{} bytes", name.len());
        assert!(name.starts_with("2024-01-01 12h00m00s - alice - 한"));
        assert!(name.ends_with("한.mp4"));
        // 31 prefix bytes and 4 extension bytes leave room for 73 three-byte chars
        assert_eq!(name.chars().filter(|c| *c == '한').count(), 73);
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate_on_char_boundary("abc", 10), "abc");
        assert_eq!(truncate_on_char_boundary("héllo", 2), "h");
    }

    #[test]
    fn test_empty_title() {
        let at = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2023, 7, 9, 8, 5, 3)
            .unwrap();
        assert_eq!(
            recording_filename(&at, "bob", "", "ts"),
            "2023-07-09 08h05m03s - bob - .ts"
        );
    }
}
