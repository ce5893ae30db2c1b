use crate::error::{CharrefError, Result};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const CACHE_FILE_NAME: &str = "html5charref.json";

/// Reads a persisted reference table. A missing file is reported as
/// [`CharrefError::CacheNotFound`] so callers can fall back to a refresh.
pub fn load_cache(path: &Path) -> Result<BTreeMap<String, char>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(CharrefError::CacheNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(error) => return Err(error.into()),
    };
    parse_cache(&content, path)
}

/// Writes `entries` to `path`, replacing any previous cache in one rename.
/// Each writer stages into its own temporary file in the target directory.
pub fn save_cache(path: &Path, entries: &BTreeMap<String, char>) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;

    let content = to_cache_json(entries)?;
    let mut staging = NamedTempFile::new_in(parent)?;
    staging.write_all(content.as_bytes())?;
    staging.persist(path).map_err(io::Error::from)?;
    Ok(())
}

pub fn parse_cache(content: &str, origin: &Path) -> Result<BTreeMap<String, char>> {
    let raw: BTreeMap<String, String> =
        serde_json::from_str(content).map_err(|error| CharrefError::JsonParse {
            path: origin.to_path_buf(),
            message: error.to_string(),
        })?;

    raw.into_iter()
        .map(|(name, value)| {
            let mut characters = value.chars();
            match (characters.next(), characters.next()) {
                (Some(character), None) => Ok((name, character)),
                _ => Err(CharrefError::InvalidEntry { name, value }),
            }
        })
        .collect()
}

/// Serializes entries in the persisted layout: sorted keys, one entry per
/// line without indentation, and every non-ASCII character written as
/// `\uXXXX` escapes (surrogate pairs above the BMP).
pub fn to_cache_json(entries: &BTreeMap<String, char>) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, AsciiFormatter::new());
    entries
        .serialize(&mut serializer)
        .map_err(|error| io::Error::other(error.to_string()))?;
    let content = String::from_utf8(buffer).map_err(|error| io::Error::other(error.to_string()))?;
    Ok(content)
}

struct AsciiFormatter {
    inner: PrettyFormatter<'static>,
}

impl AsciiFormatter {
    fn new() -> Self {
        Self {
            inner: PrettyFormatter::with_indent(b""),
        }
    }
}

impl Formatter for AsciiFormatter {
    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        for character in fragment.chars() {
            if character.is_ascii() {
                writer.write_all(&[character as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in character.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn sample_entries() -> BTreeMap<String, char> {
        BTreeMap::from([
            ("&copy;".to_string(), '\u{00A9}'),
            ("&COPY;".to_string(), '\u{00A9}'),
            ("&amp;".to_string(), '&'),
            ("&quot;".to_string(), '"'),
            ("&NewLine;".to_string(), '\n'),
            ("&Afr;".to_string(), '\u{1D504}'),
        ])
    }

    #[test]
    fn test_save_and_load_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join(CACHE_FILE_NAME);

        save_cache(&path, &sample_entries()).unwrap();
        let loaded = load_cache(&path).unwrap();

        assert_eq!(loaded, sample_entries());
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, [CACHE_FILE_NAME]);
    }

    #[test]
    fn test_concurrent_save_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        let entries: BTreeMap<String, char> = (0..3000u32)
            .map(|index| (format!("&n{index};"), char::from_u32(0x4E00 + index).unwrap()))
            .collect();

        for _ in 0..20 {
            thread::scope(|scope| {
                let writers: Vec<_> = (0..4)
                    .map(|_| scope.spawn(|| save_cache(&path, &entries)))
                    .collect();
                for writer in writers {
                    writer.join().unwrap().unwrap();
                }
            });
            assert_eq!(load_cache(&path).unwrap(), entries);
        }

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_cache_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);

        save_cache(&path, &sample_entries()).unwrap();
        let smaller = BTreeMap::from([("&lt;".to_string(), '<')]);
        save_cache(&path, &smaller).unwrap();

        assert_eq!(load_cache(&path).unwrap(), smaller);
    }

    #[test]
    fn test_load_cache_nonexistent() {
        let dir = TempDir::new().unwrap();
        let error = load_cache(&dir.path().join(CACHE_FILE_NAME)).unwrap_err();
        assert!(error.is_cache_miss());
    }

    #[test]
    fn test_load_cache_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let error = load_cache(&path).unwrap_err();
        assert!(matches!(error, CharrefError::JsonParse { .. }));
    }

    #[test]
    fn test_parse_cache_rejects_multi_character_values() {
        let error = parse_cache(r#"{"&nvlt;": "<\u20d2"}"#, Path::new("inline")).unwrap_err();
        match error {
            CharrefError::InvalidEntry { name, .. } => assert_eq!(name, "&nvlt;"),
            other => panic!("expected InvalidEntry, got {other:?}"),
        }

        let error = parse_cache(r#"{"&empty;": ""}"#, Path::new("inline")).unwrap_err();
        assert!(matches!(error, CharrefError::InvalidEntry { .. }));
    }

    #[test]
    fn test_parse_cache_accepts_raw_utf8() {
        let parsed = parse_cache("{\"&copy;\": \"\u{00A9}\"}", Path::new("inline")).unwrap();
        assert_eq!(parsed.get("&copy;"), Some(&'\u{00A9}'));
    }

    #[test]
    fn test_cache_json_layout() {
        let json = to_cache_json(&sample_entries()).unwrap();
        let expected = concat!(
            "{\n",
            "\"&Afr;\": \"\\ud835\\udd04\",\n",
            "\"&COPY;\": \"\\u00a9\",\n",
            "\"&NewLine;\": \"\\n\",\n",
            "\"&amp;\": \"&\",\n",
            "\"&copy;\": \"\\u00a9\",\n",
            "\"&quot;\": \"\\\"\"\n",
            "}"
        );
        assert_eq!(json, expected);
    }

    #[test]
    fn test_cache_json_empty() {
        assert_eq!(to_cache_json(&BTreeMap::new()).unwrap(), "{}");
    }
}
