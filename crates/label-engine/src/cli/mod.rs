//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `template` - 输出规则模板
//! - `check` - 校验并编译规则表
//! - `label` - 对数据文件批量打标签
//! - `sql` - 将规则表编译为 SQL 条件
//!
//! # 使用示例
//!
//! ```bash
//! simplelabel template -o rules.json
//! simplelabel check --rules rules.json
//! simplelabel label --rules rules.json --data bills.json --mapping mapping.json --trace
//! simplelabel sql --rules rules.json --identifiers ids.json --dialect postgres --joined
//! ```

pub mod commands;
pub mod runner;

pub use commands::{joined_override, Cli, Commands};
pub use runner::CommandRunner;
