//! 共享库
//!
//! 包含命令行工具与后续服务共用的配置加载与日志初始化代码。

pub mod config;
pub mod observability;
