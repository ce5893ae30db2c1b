use html5_charref::{Charrefs, LoaderConfig, TableLoader};
use log::debug;
use std::io::{self, Read, Write};
use std::path::PathBuf;

pub struct LoadOptions {
    pub config: Option<PathBuf>,
    pub cache: Option<PathBuf>,
}

impl LoadOptions {
    fn loader_config(&self) -> Result<LoaderConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_file(path)?,
            None => LoaderConfig::default(),
        };

        if let Some(cache) = &self.cache {
            config = config.with_cache_path(cache);
        }

        debug!("Using loader config {config:?}");
        Ok(config)
    }

    fn charrefs(&self) -> Result<Charrefs, Box<dyn std::error::Error>> {
        Ok(Charrefs::from_config(&self.loader_config()?)?)
    }
}

fn read_input(text: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    match text {
        Some(text) => Ok(text.to_string()),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn write_output(output: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}

pub fn escape(
    options: &LoadOptions,
    text: Option<&str>,
    named_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let charrefs = options.charrefs()?;
    let input = read_input(text)?;
    let trimmed = input.strip_suffix('\n').unwrap_or(&input);
    write_output(&charrefs.escape_text(trimmed, named_only))
}

pub fn unescape(
    options: &LoadOptions,
    text: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let charrefs = options.charrefs()?;
    let input = read_input(text)?;
    write_output(&charrefs.unescape(&input))
}

pub fn names(options: &LoadOptions, character: char) -> Result<(), Box<dyn std::error::Error>> {
    let charrefs = options.charrefs()?;
    let names = charrefs.escape_char_advanced(character).unwrap_or_default();

    if names.is_empty() {
        eprintln!("No named reference for U+{:04X}", u32::from(character));
    } else {
        write_output(&names.join("\n"))?;
    }
    Ok(())
}

pub fn refresh(options: &LoadOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = options.loader_config()?;
    if config.cache_path.is_none() {
        return Err("refresh needs a cache path (--cache or cache_path in the config)".into());
    }

    let table = TableLoader::from_config(&config)?.rebuild()?;
    println!("Refreshed {} character references", table.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_loader_config_defaults() {
        let options = LoadOptions {
            config: None,
            cache: None,
        };
        assert_eq!(options.loader_config().unwrap(), LoaderConfig::default());
    }

    #[test]
    fn test_cache_flag_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("charref.toml");
        fs::write(&config_path, "cache_path = \"from-file.json\"").unwrap();

        let options = LoadOptions {
            config: Some(config_path),
            cache: Some(dir.path().join("from-flag.json")),
        };
        let config = options.loader_config().unwrap();

        assert_eq!(config.cache_path, Some(dir.path().join("from-flag.json")));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let options = LoadOptions {
            config: Some(dir.path().join("missing.toml")),
            cache: None,
        };
        assert!(options.loader_config().is_err());
    }

    #[test]
    fn test_refresh_writes_cache() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("html5charref.json");
        let options = LoadOptions {
            config: None,
            cache: Some(cache.clone()),
        };

        refresh(&options).unwrap();

        assert!(cache.is_file());
        let charrefs = options.charrefs().unwrap();
        assert_eq!(charrefs.unescape("&copy;"), "\u{00A9}");
    }

    #[test]
    fn test_names_without_reference_is_not_an_error() {
        let options = LoadOptions {
            config: None,
            cache: None,
        };
        names(&options, 'a').unwrap();
        names(&options, '\u{00A9}').unwrap();
    }

    #[test]
    fn test_refresh_requires_cache_path() {
        let options = LoadOptions {
            config: None,
            cache: None,
        };
        assert!(refresh(&options).is_err());
    }
}
