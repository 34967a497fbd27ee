//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 标注配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    /// 匹配策略：first_match（首条命中）或 all_matches（全部命中）
    pub policy: String,
    /// all_matches 策略下多个标签的分隔符
    pub separator: String,
    /// 输出数据中标签列的列名
    pub label_column: String,
    /// 未命中任何规则时写入的标签，为空时保留空值
    pub unlabeled_label: Option<String>,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            policy: "first_match".to_string(),
            separator: "；".to_string(),
            label_column: "类别标签".to_string(),
            unlabeled_label: None,
        }
    }
}

/// SQL 生成配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// generic / mysql / postgres / sqlite
    pub dialect: String,
    /// 是否输出合并后的 CASE WHEN 表达式
    pub joined: bool,
    /// CASE 表达式的 ELSE 标签
    pub else_label: Option<String>,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            dialect: "generic".to_string(),
            joined: false,
            else_label: None,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub labeling: LabelingConfig,
    pub sql: SqlConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（SIMPLELABEL_ 前缀，层级用双下划线，如 SIMPLELABEL_SQL__DIALECT -> sql.dialect）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("SIMPLELABEL_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), &env, service_name)
    }

    /// 从指定目录加载配置
    pub fn load_from(config_dir: &Path, env: &str, service_name: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("SIMPLELABEL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
