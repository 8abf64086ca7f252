//! Profile 模块
//!
//! # 设计思路
//!
//! Profile 是一组具名的格式化配置：包含哪些字段、分隔符与前后缀、替换规则。
//! 集合（`ProfileCollection`）是唯一需要持久化的状态，所有变更操作都以
//! "旧集合进、新集合出"的方式进行，不在原地修改共享状态。
//!
//! # 实现思路
//!
//! - 内置模板 `Profile::template()` 是一个不可变的值，新建与首次初始化都从它克隆。
//! - 字段编辑通过 `ProfilePatch` 的具名可选字段完成，保持每个字段的类型约束。
//! - 旧版本存储格式的读取与字段回填集中在 `migration` 子模块。
//!
//! | 子模块 | 职责 |
//! |------|------|
//! | `collection` | 集合不变量与增删改、默认 Profile 指针 |
//! | `patch` | 字段级编辑补丁 |
//! | `migration` | 历史格式兼容读取 |

use serde::{Deserialize, Serialize};

use crate::rules::ReplacementRule;

mod collection;
mod migration;
mod patch;

pub use collection::*;
pub use migration::*;
pub use patch::*;

/// 内置模板的 ID，也是首次初始化时种子 Profile 的 ID
pub const TEMPLATE_PROFILE_ID: i64 = 1000;
pub const TEMPLATE_PROFILE_NAME: &str = "Standard";
/// 新建 Profile 的默认名称
pub const NEW_PROFILE_NAME: &str = "New Profile";

/// Profile 管理错误
///
/// 两种错误调用方都可以直接恢复，集合保持不变。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// 试图删除唯一剩下的 Profile
    #[error("至少需要保留一个 Profile")]
    LastProfile,

    /// 引用了集合中不存在的 Profile
    #[error("Profile 不存在: {0}")]
    UnknownProfile(i64),
}

/// 一个具名的格式化配置
///
/// 序列化字段名沿用历史存储格式（`incId`、`sep`、`urlPrefix` 等）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// 创建后不可变，在集合内唯一
    pub id: i64,
    pub name: String,
    pub inc_id: bool,
    pub inc_name: bool,
    pub inc_url: bool,
    pub is_clickable: bool,
    #[serde(rename = "sep", alias = "separator")]
    pub separator: String,
    pub prefix: String,
    pub suffix: String,
    pub url_prefix: String,
    pub url_suffix: String,
    #[serde(default)]
    pub replacements: Vec<ReplacementRule>,
}

impl Profile {
    /// 内置模板
    pub fn template() -> Self {
        Self {
            id: TEMPLATE_PROFILE_ID,
            name: TEMPLATE_PROFILE_NAME.to_string(),
            inc_id: true,
            inc_name: true,
            inc_url: true,
            is_clickable: true,
            separator: " | ".to_string(),
            prefix: "[".to_string(),
            suffix: "]".to_string(),
            url_prefix: "(".to_string(),
            url_suffix: ")".to_string(),
            replacements: Vec::new(),
        }
    }

    /// 追加一条空白规则行
    pub fn push_placeholder_rule(&mut self) {
        self.replacements.push(ReplacementRule::placeholder());
    }

    /// 删除指定位置的规则；越界时什么都不做
    pub fn remove_rule(&mut self, index: usize) -> Option<ReplacementRule> {
        if index < self.replacements.len() {
            Some(self.replacements.remove(index))
        } else {
            None
        }
    }
}
