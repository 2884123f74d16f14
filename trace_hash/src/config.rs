use serde_derive::Deserialize;
use serde_derive::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::error::{Error, ParseConfig, ReadConfig};
use crate::hash::{HashVariant, HASH_CONST};

const DEFAULT_BITMAP_SIZE: usize = 1 << 16;
const DEFAULT_WORKDIR: &str = "/tmp/trace_hash_workdir";

// 相对路径按配置文件所在目录解析
fn into_absolute_path(config_folder: &Path, path_to_file: &str) -> PathBuf {
    let path = Path::new(path_to_file);
    if path.is_relative() {
        config_folder.join(path)
    } else {
        path.to_path_buf()
    }
}

/// config.ron 的原始内容，所有字段都可以省略
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLoader {
    pub include_default_config_path: Option<String>,
    pub seed: Option<u32>,
    pub variant: Option<HashVariant>,
    pub bitmap_size: Option<usize>,
    pub workdir_path: Option<String>,
}

impl ConfigLoader {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let cfg_file = File::open(path).context(ReadConfig { path })?;
        ron::de::from_reader(cfg_file).context(ParseConfig { path })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub seed: u32,
    pub variant: HashVariant,
    pub bitmap_size: usize,
    pub workdir_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: HASH_CONST,
            variant: HashVariant::Native,
            bitmap_size: DEFAULT_BITMAP_SIZE,
            workdir_path: DEFAULT_WORKDIR.to_string(),
        }
    }
}

impl Config {
    /// 合并顺序：config > default > 内置默认值
    pub fn new_from_loader(default: ConfigLoader, config: ConfigLoader) -> Self {
        let builtin = Self::default();
        Self {
            seed: config.seed.or(default.seed).unwrap_or(builtin.seed),
            variant: config.variant.or(default.variant).unwrap_or(builtin.variant),
            bitmap_size: config
                .bitmap_size
                .or(default.bitmap_size)
                .unwrap_or(builtin.bitmap_size),
            workdir_path: config
                .workdir_path
                .or(default.workdir_path)
                .unwrap_or(builtin.workdir_path),
        }
    }

    /// 读取配置文件，如果指定了include_default_config_path，则先读取该默认配置
    pub fn new_from_file(path: &Path) -> Result<Self, Error> {
        let cfg = ConfigLoader::load(path)?;
        let default = match cfg.include_default_config_path.as_ref() {
            Some(default_path) => {
                let config_folder = path.parent().unwrap_or_else(|| Path::new("."));
                ConfigLoader::load(&into_absolute_path(config_folder, default_path))?
            }
            None => ConfigLoader::default(),
        };
        Ok(Self::new_from_loader(default, cfg))
    }
}
