//! # 工单链接复制工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            宿主（浏览器扩展 / 命令行 / 其他界面）          │
//! │                                                          │
//! │  页面快照 ── 编辑界面 ── 提示 "Copied: <name>"           │
//! └───────┼──────────────┼───────────────────────────────────┘
//!         ↕              ↕ Result<T, AppError>
//! ┌───────┼──────────────┼───────────────────────────────────┐
//! │       ↕            核心 (Rust)                           │
//! │                                                          │
//! │  extract ──→ rules ──→ format ──→ clipboard              │
//! │  {id,title,url}  替换    纯文本+HTML   写入 + 重试        │
//! │                    ↑        ↑                            │
//! │                 profile (集合 / 补丁 / 迁移)              │
//! │                    ↕                                     │
//! │                 settings ── storage  (settings.json)     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`ticket`] | 三个原始字段与规则目标字段 |
//! | [`rules`] | 有序 find/replace 规则引擎，无效正则降级为跳过 |
//! | [`format`] | 按 Profile 渲染纯文本与 HTML，设置页预览 |
//! | [`profile`] | Profile 数据模型、集合增删改、默认指针、历史格式迁移 |
//! | [`settings`] | 集合与主题的持久化存储 |
//! | [`storage`] | 数据目录的获取与自动创建 |
//! | [`extract`] | 字段提取契约与页面快照实现 |
//! | [`clipboard`] | 剪贴板发布契约与 `arboard` 实现 |
//! | [`copy`] | 一次完整的复制流程 |

pub mod clipboard;
pub mod copy;
pub mod error;
pub mod extract;
pub mod format;
pub mod profile;
pub mod rules;
pub mod settings;
pub mod storage;
pub mod ticket;
