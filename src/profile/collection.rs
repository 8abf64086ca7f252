//! Profile 集合子模块
//!
//! ## 职责
//! - 维护集合不变量：ID 唯一、集合非空、默认指针指向已存在的 Profile
//! - 提供初始化、新建、删除、设为默认、字段更新
//!
//! ## 输入/输出
//! - 输入：旧集合（借用）与操作参数
//! - 输出：新集合；旧集合不被修改，失败时调用方手里的集合原样保留
//!
//! ## 错误语义
//! - 删除最后一个 Profile → `ProfileError::LastProfile`
//! - 引用不存在的 ID → `ProfileError::UnknownProfile`

use serde::Serialize;

use super::{NEW_PROFILE_NAME, Profile, ProfileError, ProfilePatch};

/// 全部 Profile 与默认 Profile 指针
///
/// 只能通过 `seeded` / `initialize` / 迁移读取构造，因此始终非空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCollection {
    profiles: Vec<Profile>,
    default_profile_id: i64,
}

/// 生成一个不与现有 ID 冲突的新 ID
///
/// 以毫秒时间戳为基础；同一毫秒内连续新建时顺延为当前最大 ID + 1。
pub fn next_profile_id(existing: &[Profile], now_ms: i64) -> i64 {
    let max_existing = existing.iter().map(|p| p.id).max().unwrap_or(i64::MIN);
    now_ms.max(max_existing.saturating_add(1))
}

impl ProfileCollection {
    /// 仅含模板一个 Profile 的集合
    pub fn seeded(template: &Profile) -> Self {
        Self {
            profiles: vec![template.clone()],
            default_profile_id: template.id,
        }
    }

    /// 首次运行初始化
    ///
    /// 已有集合时原样返回；没有时用模板播种。重复调用结果不变。
    pub fn initialize(existing: Option<ProfileCollection>, template: &Profile) -> Self {
        match existing {
            Some(collection) => collection,
            None => {
                log::info!("🌱 未找到已保存的 Profile，使用内置模板初始化");
                Self::seeded(template)
            }
        }
    }

    /// 由迁移流程在保证非空、ID 唯一之后调用
    pub(crate) fn from_parts(profiles: Vec<Profile>, default_profile_id: i64) -> Self {
        debug_assert!(!profiles.is_empty());
        Self {
            profiles,
            default_profile_id,
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn default_profile_id(&self) -> i64 {
        self.default_profile_id
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn get(&self, id: i64) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    /// 解析当前默认 Profile
    ///
    /// 默认指针失效时回退到第一个 Profile，而不是报错。
    pub fn active_profile(&self) -> &Profile {
        match self.get(self.default_profile_id) {
            Some(profile) => profile,
            None => {
                log::warn!(
                    "⚠️ 默认 Profile {} 不存在，回退到第一个 Profile",
                    self.default_profile_id
                );
                &self.profiles[0]
            }
        }
    }

    /// 从模板克隆一个新 Profile 追加到末尾，默认指针不变
    pub fn add_profile(&self, template: &Profile) -> (Self, i64) {
        self.add_profile_at(template, chrono::Utc::now().timestamp_millis())
    }

    /// 同 `add_profile`，时间戳由调用方提供
    pub fn add_profile_at(&self, template: &Profile, now_ms: i64) -> (Self, i64) {
        let id = next_profile_id(&self.profiles, now_ms);
        let profile = Profile {
            id,
            name: NEW_PROFILE_NAME.to_string(),
            ..template.clone()
        };

        let mut next = self.clone();
        next.profiles.push(profile);
        log::info!("➕ 新建 Profile {}", id);
        (next, id)
    }

    /// 删除 Profile
    ///
    /// 被删的是默认 Profile 时，默认指针改为剩余的第一个。
    pub fn delete_profile(&self, id: i64) -> Result<Self, ProfileError> {
        if self.profiles.len() <= 1 {
            return Err(ProfileError::LastProfile);
        }
        if !self.contains(id) {
            return Err(ProfileError::UnknownProfile(id));
        }

        let mut next = self.clone();
        next.profiles.retain(|p| p.id != id);
        if next.default_profile_id == id {
            next.default_profile_id = next.profiles[0].id;
            log::info!("🔁 默认 Profile 被删除，改为 {}", next.default_profile_id);
        }
        log::info!("🗑️ 删除 Profile {}", id);
        Ok(next)
    }

    pub fn set_default(&self, id: i64) -> Result<Self, ProfileError> {
        if !self.contains(id) {
            return Err(ProfileError::UnknownProfile(id));
        }
        let mut next = self.clone();
        next.default_profile_id = id;
        Ok(next)
    }

    /// 用补丁更新指定 Profile 的可变字段
    pub fn update_profile(&self, id: i64, patch: &ProfilePatch) -> Result<Self, ProfileError> {
        let mut next = self.clone();
        let profile = next
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ProfileError::UnknownProfile(id))?;
        patch.apply_to(profile);
        Ok(next)
    }
}
