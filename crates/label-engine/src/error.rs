//! 标注引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("不支持的输入数据结构: {0}")]
    UnsupportedInput(String),

    #[error("无效的筛选条件: '{token}'")]
    InvalidCondition { token: String },

    #[error("无效的关联条件: '{token}'")]
    InvalidLogic { token: String },

    #[error("第 {row} 条规则无效: {reason}")]
    InvalidRule { row: usize, reason: String },

    #[error("无效的正则表达式 '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("字段未配置字段标识: {field}")]
    MissingColumnMapping { field: String },

    #[error("字段 '{field}' 的字段标识无效: '{identifier}'")]
    InvalidColumnIdentifier { field: String, identifier: String },

    #[error("未知的匹配策略: '{token}'")]
    InvalidPolicy { token: String },

    #[error("未知的 SQL 方言: '{token}'")]
    InvalidDialect { token: String },

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LabelError>;
