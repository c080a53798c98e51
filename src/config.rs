//! Parses config file
use std::{
    env,
    fs::OpenOptions,
    io::Read,
    path::{Path, PathBuf},
};

use eyre::eyre;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Additional checks while decoding.
    pub strict: bool,
    /// Replace files that already exist.
    pub overwrite: bool,
    /// Where outputs go. Next to each input when unset.
    pub output_dir: Option<PathBuf>,
    /// Also write a `.png` of every unpacked frame.
    pub preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: true,
            overwrite: false,
            output_dir: None,
            preview: false,
        }
    }
}

pub static CONFIG_FILE_NAME: &str = "fsunpack.toml";

/// Parse `fsunpack.toml` in the same folder as the binary
///
/// Having no config file there is fine.
pub fn parse_config() -> eyre::Result<Config> {
    let path = match env::current_exe() {
        Ok(path) => path
            .parent()
            .map(|parent| parent.join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
        Err(_) => PathBuf::from(CONFIG_FILE_NAME),
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    parse_config_from_file(path.as_path())
}

pub fn parse_config_from_file(path: &Path) -> eyre::Result<Config> {
    let mut file = OpenOptions::new()
        .read(true)
        .open(path.as_os_str())
        .map_err(|op| eyre!("Cannot open config {}: {}", path.display(), op))?;
    let mut buffer = String::new();

    file.read_to_string(&mut buffer)?;

    let mut config: Config = toml::from_str(&buffer)?;

    // relative output folder is relative to the config
    if let Some(output_dir) = config.output_dir.take() {
        let root = path.parent().unwrap_or(Path::new("."));

        config.output_dir = Some(if output_dir.is_relative() {
            root.join(output_dir)
        } else {
            output_dir
        });
    }

    Ok(config)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
        assert!(config.strict);
    }

    #[test]
    fn partial_file() {
        let config: Config = toml::from_str("strict = false\npreview = true").unwrap();

        assert!(!config.strict);
        assert!(config.preview);
        assert!(!config.overwrite);
        assert_eq!(config.output_dir, None);
    }

    #[test]
    fn output_dir_is_relative_to_config() {
        let dir = env::temp_dir().join(format!("fsunpack_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "output_dir = \"out\"\noverwrite = true\n").unwrap();

        let config = parse_config_from_file(&path).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(config.output_dir, Some(dir.join("out")));
        assert!(config.overwrite);
    }

    #[test]
    fn unknown_value_type_is_an_error() {
        assert!(toml::from_str::<Config>("strict = \"yes\"").is_err());
    }
}
