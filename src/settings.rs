//! 设置存储模块
//!
//! # 设计思路
//!
//! Profile 集合是唯一需要持久化的状态，主题偏好与之并列保存在同一个 JSON 文件中。
//! 打开时完成迁移与首次初始化；之后每次编辑都是"读取 → 计算新集合 → 写回"。
//!
//! # 实现思路
//!
//! - 内存中的状态由 `Mutex` 保护，同一时刻只允许一个编辑在进行；
//!   并发触发时后写入者覆盖先写入者。
//! - 编辑闭包接收旧集合、返回新集合；闭包返回错误或写盘失败时内存状态保持不变。
//! - 磁盘内容与迁移结果一致时不回写，重复打开不会产生多余写入。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::profile::{
    Profile, ProfileCollection, ProfilePatch, SCHEMA_VERSION, migrate_collection,
};

/// 界面主题偏好，与格式化逻辑无关
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// 写入磁盘的文档
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState<'a> {
    schema_version: u32,
    #[serde(flatten)]
    collection: &'a ProfileCollection,
    theme: Theme,
}

struct StoreState {
    collection: ProfileCollection,
    theme: Theme,
}

/// 读取设置文件；文件不存在时返回 `None`
fn read_document(path: &Path) -> Result<Option<Value>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let parsed = serde_json::from_str::<Value>(&content)
        .map_err(|e| AppError::Storage(format!("解析设置文件失败: {}", e)))?;
    Ok(Some(parsed))
}

fn write_document(path: &Path, collection: &ProfileCollection, theme: Theme) -> Result<(), AppError> {
    let state = PersistedState {
        schema_version: SCHEMA_VERSION,
        collection,
        theme,
    };
    let content = serde_json::to_string_pretty(&state)
        .map_err(|e| AppError::Storage(format!("序列化设置失败: {}", e)))?;

    fs::write(path, content)?;
    Ok(())
}

fn parse_theme(doc: &Value) -> Theme {
    doc.get("theme")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Profile 集合与主题的持久化存储
pub struct SettingsStore {
    path: PathBuf,
    template: Profile,
    state: Mutex<StoreState>,
}

impl SettingsStore {
    /// 打开设置文件，使用内置模板
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        Self::open_with_template(path, Profile::template())
    }

    /// 打开设置文件
    ///
    /// 没有已保存的集合时用模板播种；旧格式读取后回写为当前格式。
    pub fn open_with_template(path: impl Into<PathBuf>, template: Profile) -> Result<Self, AppError> {
        let path = path.into();
        let doc = read_document(&path)?;
        let theme = doc.as_ref().map(parse_theme).unwrap_or_default();

        let migrated = doc.as_ref().and_then(|doc| {
            migrate_collection(doc, &template, chrono::Utc::now().timestamp_millis())
        });
        let needs_write = migrated.as_ref().is_none_or(|m| m.changed);
        let collection = ProfileCollection::initialize(migrated.map(|m| m.collection), &template);

        if needs_write {
            write_document(&path, &collection, theme)?;
            log::info!("💾 设置文件已写入: {}", path.display());
        }

        log::debug!(
            "📂 已加载 {} 个 Profile，默认 {}",
            collection.len(),
            collection.default_profile_id()
        );

        Ok(Self {
            path,
            template,
            state: Mutex::new(StoreState { collection, theme }),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, AppError> {
        self.state
            .lock()
            .map_err(|e| AppError::Storage(format!("设置状态锁已损坏: {}", e)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn template(&self) -> &Profile {
        &self.template
    }

    /// 当前集合的快照
    pub fn collection(&self) -> Result<ProfileCollection, AppError> {
        Ok(self.lock()?.collection.clone())
    }

    pub fn theme(&self) -> Result<Theme, AppError> {
        Ok(self.lock()?.theme)
    }

    /// 读取 → 计算新集合 → 写回
    pub fn edit<F>(&self, f: F) -> Result<ProfileCollection, AppError>
    where
        F: FnOnce(&ProfileCollection) -> Result<ProfileCollection, AppError>,
    {
        let mut state = self.lock()?;
        let next = f(&state.collection)?;
        write_document(&self.path, &next, state.theme)?;
        state.collection = next.clone();
        Ok(next)
    }

    pub fn add_profile(&self) -> Result<i64, AppError> {
        let mut new_id = 0;
        self.edit(|c| {
            let (next, id) = c.add_profile(&self.template);
            new_id = id;
            Ok(next)
        })?;
        Ok(new_id)
    }

    pub fn delete_profile(&self, id: i64) -> Result<ProfileCollection, AppError> {
        self.edit(|c| Ok(c.delete_profile(id)?))
    }

    pub fn set_default(&self, id: i64) -> Result<ProfileCollection, AppError> {
        self.edit(|c| Ok(c.set_default(id)?))
    }

    pub fn update_profile(&self, id: i64, patch: &ProfilePatch) -> Result<ProfileCollection, AppError> {
        self.edit(|c| Ok(c.update_profile(id, patch)?))
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), AppError> {
        let mut state = self.lock()?;
        write_document(&self.path, &state.collection, theme)?;
        state.theme = theme;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("copy-ticket-settings-test-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn theme_is_read_leniently() {
        assert_eq!(parse_theme(&serde_json::json!({"theme": "dark"})), Theme::Dark);
        assert_eq!(parse_theme(&serde_json::json!({"theme": "sepia"})), Theme::Light);
        assert_eq!(parse_theme(&serde_json::json!({})), Theme::Light);
    }

    #[test]
    fn failed_edit_leaves_state_and_file_untouched() {
        let dir = unique_temp_dir();
        let path = dir.join("settings.json");
        let store = SettingsStore::open(&path).expect("open");
        let before = fs::read_to_string(&path).expect("read");

        let result = store.delete_profile(1000);
        assert!(result.is_err());
        assert_eq!(store.collection().expect("snapshot").len(), 1);
        assert_eq!(fs::read_to_string(&path).expect("read"), before);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn written_document_carries_schema_version_and_theme() {
        let dir = unique_temp_dir();
        let path = dir.join("settings.json");
        let store = SettingsStore::open(&path).expect("open");
        store.set_theme(Theme::Dark).expect("set theme");

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(doc["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(doc["theme"], "dark");
        assert_eq!(doc["defaultProfileId"], 1000);
        assert_eq!(doc["profiles"][0]["name"], "Standard");

        let _ = fs::remove_dir_all(dir);
    }
}
