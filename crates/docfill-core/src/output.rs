//! Output file naming

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

/// Default timestamp suffix format
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Field whose value names output files unless configured otherwise
pub const DEFAULT_KEY_FIELD: &str = "[nome do aluno]";

const ILLEGAL_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Make a key value usable inside a file name
///
/// Trims, replaces spaces with `_` and drops characters that are illegal in
/// file names on common platforms.
pub fn sanitize_key(key: &str) -> String {
    key.trim()
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// `{base}_{suffix}.docx`, where the suffix is the sanitized key or, when
/// that is empty, `now` formatted with `timestamp_format` and sanitized the
/// same way
pub fn output_file_name<Tz>(
    base_name: &str,
    key: Option<&str>,
    now: &DateTime<Tz>,
    timestamp_format: &str,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let suffix = key
        .map(sanitize_key)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| sanitize_key(&now.format(timestamp_format).to_string()));
    format!("{}_{}.docx", base_name, suffix)
}

/// `dir/file_name`, or the first free `stem_N.ext` for N = 2, 3, ...
pub fn unique_output_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };

    (2u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{}_{}.{}", stem, n, ext)),
            None => dir.join(format!("{}_{}", stem, n)),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
