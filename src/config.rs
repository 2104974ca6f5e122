//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::Category;

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration / 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Document and page image folders / 文档与页面图片目录
    #[serde(default)]
    pub storage: StorageConfig,
    /// Transaction audit settings / 交易审计配置
    #[serde(default)]
    pub audit: AuditConfig,
    /// PDF ingestion settings / PDF导入配置
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Database configuration / 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Data directory path / 数据目录路径
    pub data_dir: String,
    /// Index database file path (relative to data_dir) / 索引数据库文件路径
    pub db_file: String,
}

/// Storage configuration / 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Original uploads, one sub folder per category / 原始文件目录
    pub documents_dir: String,
    /// Rendered page images: <category>/<stem>/<page>.png / 页面图片目录
    pub images_dir: String,
    /// Static assets served under /static / 静态资源目录
    pub static_dir: String,
}

/// Audit configuration / 审计配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Holiday calendar workbook (xlsx or csv) / 节假日表
    pub holiday_file: String,
    /// Ratio at which two invoice numbers count as near duplicates / 发票相似度阈值
    pub similarity_threshold: f64,
}

/// Ingestion configuration / 导入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Longest edge of a rendered page in pixels / 渲染页面最长边像素
    pub max_rendered_pixels: u32,
    /// Directory holding the pdfium shared library, system path when empty / pdfium库目录
    #[serde(default)]
    pub pdfium_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8180,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            db_file: "documents.db".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            documents_dir: "documents".to_string(),
            images_dir: "page_images".to_string(),
            static_dir: "static".to_string(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            holiday_file: "holidays.xlsx".to_string(),
            similarity_threshold: 0.8,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 2000,
            pdfium_dir: None,
        }
    }
}

impl AppConfig {
    /// Get the full database URL / 获取完整的数据库URL
    pub fn get_database_url(&self) -> String {
        let db_path = Path::new(&self.database.data_dir).join(&self.database.db_file);
        format!("sqlite:{}?mode=rwc", db_path.to_string_lossy())
    }

    /// Get the full data directory path / 获取完整的数据目录路径
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.database.data_dir)
    }

    /// Folder holding uploads of one category / 分类原始文件目录
    pub fn get_category_dir(&self, category: Category) -> PathBuf {
        Path::new(&self.storage.documents_dir).join(category.folder())
    }

    /// Folder holding the page images of one document / 文档页面图片目录
    pub fn get_page_image_dir(&self, category: Category, stem: &str) -> PathBuf {
        Path::new(&self.storage.images_dir)
            .join(category.folder())
            .join(stem)
    }

    /// Path of a single rendered page / 单页图片路径
    pub fn get_page_image_path(&self, category: Category, stem: &str, page: u32) -> PathBuf {
        self.get_page_image_dir(category, stem)
            .join(format!("{}.png", page))
    }

    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    load_config_from(&get_config_path())
}

/// Load configuration from an explicit path / 从指定路径加载配置
pub fn load_config_from(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        let config = AppConfig::default();
        save_config_to(&config, config_path)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config_to(config: &AppConfig, config_path: &Path) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}
