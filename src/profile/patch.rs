//! 字段编辑补丁子模块
//!
//! ## 职责
//! - 描述一次编辑会话对 Profile 可变字段的修改
//! - 每个字段单独可选，未设置的字段保持原值
//!
//! ## 输入/输出
//! - 输入：`&mut Profile`
//! - 输出：原地更新后的 Profile
//!
//! ## 错误语义
//! - `id` 不属于补丁：反序列化时出现 `id`（或任何未知字段）直接报错

use serde::{Deserialize, Serialize};

use crate::rules::ReplacementRule;

use super::Profile;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inc_id: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inc_name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inc_url: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_clickable: Option<bool>,
    #[serde(rename = "sep", alias = "separator", skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacements: Option<Vec<ReplacementRule>>,
}

impl ProfilePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn inc_id(mut self, value: bool) -> Self {
        self.inc_id = Some(value);
        self
    }

    pub fn inc_name(mut self, value: bool) -> Self {
        self.inc_name = Some(value);
        self
    }

    pub fn inc_url(mut self, value: bool) -> Self {
        self.inc_url = Some(value);
        self
    }

    pub fn is_clickable(mut self, value: bool) -> Self {
        self.is_clickable = Some(value);
        self
    }

    pub fn separator(mut self, value: impl Into<String>) -> Self {
        self.separator = Some(value.into());
        self
    }

    pub fn prefix(mut self, value: impl Into<String>) -> Self {
        self.prefix = Some(value.into());
        self
    }

    pub fn suffix(mut self, value: impl Into<String>) -> Self {
        self.suffix = Some(value.into());
        self
    }

    pub fn url_prefix(mut self, value: impl Into<String>) -> Self {
        self.url_prefix = Some(value.into());
        self
    }

    pub fn url_suffix(mut self, value: impl Into<String>) -> Self {
        self.url_suffix = Some(value.into());
        self
    }

    pub fn replacements(mut self, value: Vec<ReplacementRule>) -> Self {
        self.replacements = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 将补丁写入 Profile，`id` 不受影响
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(v) = &self.name {
            profile.name = v.clone();
        }
        if let Some(v) = self.inc_id {
            profile.inc_id = v;
        }
        if let Some(v) = self.inc_name {
            profile.inc_name = v;
        }
        if let Some(v) = self.inc_url {
            profile.inc_url = v;
        }
        if let Some(v) = self.is_clickable {
            profile.is_clickable = v;
        }
        if let Some(v) = &self.separator {
            profile.separator = v.clone();
        }
        if let Some(v) = &self.prefix {
            profile.prefix = v.clone();
        }
        if let Some(v) = &self.suffix {
            profile.suffix = v.clone();
        }
        if let Some(v) = &self.url_prefix {
            profile.url_prefix = v.clone();
        }
        if let Some(v) = &self.url_suffix {
            profile.url_suffix = v.clone();
        }
        if let Some(v) = &self.replacements {
            profile.replacements = v.clone();
        }
    }
}
