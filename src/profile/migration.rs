//! 存储格式迁移子模块
//!
//! ## 职责
//! - 从任意历史版本的存储文档中读取 Profile 集合
//! - v1：顶层扁平设置（无 `profiles`）→ 转换为单个 Profile
//! - v2：Profile 缺少 `isClickable` / `replacements` → 用模板值回填
//! - 修复缺失/重复的 ID、失效的默认指针、无法识别的规则目标
//!
//! ## 输入/输出
//! - 输入：`&serde_json::Value`（整个存储文档）、内置模板
//! - 输出：`Option<MigratedCollection>`，文档中没有任何 Profile 数据时为 `None`
//!
//! ## 错误语义
//! - 前向兼容读取，不做硬校验：字段缺失或类型不符时回填模板值并记录 warn 日志

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::rules::ReplacementRule;
use crate::ticket::FieldTarget;

use super::{Profile, ProfileCollection};

/// 当前存储格式版本
pub const SCHEMA_VERSION: u32 = 3;

/// v1 扁平格式中出现在顶层的设置项
const LEGACY_KEYS: [&str; 8] = [
    "incId", "incName", "incUrl", "sep", "prefix", "suffix", "urlPrefix", "urlSuffix",
];

/// 迁移结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratedCollection {
    pub collection: ProfileCollection,
    /// 读取到的原始版本
    pub from_version: u32,
    /// 为 `true` 时磁盘上的内容与迁移结果不一致，需要回写
    pub changed: bool,
}

/// 判断存储文档的格式版本；什么都没存时为 0
pub fn detect_version(doc: &Value) -> u32 {
    if let Some(version) = doc.get("schemaVersion").and_then(Value::as_u64) {
        return version as u32;
    }
    if doc.get("profiles").is_some_and(Value::is_array) {
        return 2;
    }
    if LEGACY_KEYS.iter().any(|key| doc.get(*key).is_some()) {
        return 1;
    }
    0
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 逐字段读取，缺失或类型不符时使用模板值
struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    backfilled: Vec<&'static str>,
}

impl<'a> FieldReader<'a> {
    fn new(obj: &'a Map<String, Value>) -> Self {
        Self {
            obj,
            backfilled: Vec::new(),
        }
    }

    fn lookup(&self, keys: &[&'static str]) -> Option<&'a Value> {
        keys.iter().find_map(|key| self.obj.get(*key))
    }

    fn bool(&mut self, keys: &[&'static str], fallback: bool) -> bool {
        match self.lookup(keys).and_then(Value::as_bool) {
            Some(v) => v,
            None => {
                self.backfilled.push(keys[0]);
                fallback
            }
        }
    }

    fn string(&mut self, keys: &[&'static str], fallback: &str) -> String {
        match self.lookup(keys).and_then(Value::as_str) {
            Some(v) => v.to_string(),
            None => {
                self.backfilled.push(keys[0]);
                fallback.to_string()
            }
        }
    }

    fn rules(&mut self, fallback: &[ReplacementRule]) -> (Vec<ReplacementRule>, usize) {
        let Some(items) = self.lookup(&["replacements"]).and_then(Value::as_array) else {
            self.backfilled.push("replacements");
            return (fallback.to_vec(), 0);
        };

        let mut dropped = 0;
        let rules = items
            .iter()
            .filter_map(|item| {
                let rule = migrate_rule(item);
                if rule.is_none() {
                    dropped += 1;
                }
                rule
            })
            .collect();
        (rules, dropped)
    }
}

fn migrate_rule(item: &Value) -> Option<ReplacementRule> {
    let obj = item.as_object()?;
    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let target = match obj.get("target").and_then(Value::as_str) {
        None => FieldTarget::Id,
        Some(raw) => match FieldTarget::parse(raw) {
            Some(target) => target,
            None => {
                log::warn!("⚠️ 丢弃目标字段无法识别的规则: target={}", raw);
                return None;
            }
        },
    };

    Some(ReplacementRule {
        find: text("find"),
        replace: text("replace"),
        target,
    })
}

/// 读取一个 Profile 对象的全部可变字段；返回 Profile 以及是否发生了回填/丢弃
fn migrate_fields(obj: &Map<String, Value>, template: &Profile) -> (Profile, bool) {
    let mut reader = FieldReader::new(obj);
    let (replacements, dropped_rules) = reader.rules(&template.replacements);

    let profile = Profile {
        id: template.id,
        name: reader.string(&["name", "profileName"], &template.name),
        inc_id: reader.bool(&["incId"], template.inc_id),
        inc_name: reader.bool(&["incName"], template.inc_name),
        inc_url: reader.bool(&["incUrl"], template.inc_url),
        is_clickable: reader.bool(&["isClickable"], template.is_clickable),
        separator: reader.string(&["sep", "separator"], &template.separator),
        prefix: reader.string(&["prefix"], &template.prefix),
        suffix: reader.string(&["suffix"], &template.suffix),
        url_prefix: reader.string(&["urlPrefix"], &template.url_prefix),
        url_suffix: reader.string(&["urlSuffix"], &template.url_suffix),
        replacements,
    };

    if !reader.backfilled.is_empty() {
        log::debug!("🧩 回填缺失字段: {:?}", reader.backfilled);
    }
    let changed = !reader.backfilled.is_empty() || dropped_rules > 0;
    (profile, changed)
}

/// 为缺失或重复的 ID 分配新值，返回是否有改动
fn assign_unique_ids(entries: &mut [(Option<i64>, Profile)], now_ms: i64) -> bool {
    let max_valid = entries.iter().filter_map(|(id, _)| *id).max().unwrap_or(i64::MIN);
    let mut fresh = now_ms.max(max_valid.saturating_add(1));
    let mut used = HashSet::new();
    let mut changed = false;

    for (raw_id, profile) in entries.iter_mut() {
        match raw_id {
            Some(id) if used.insert(*id) => profile.id = *id,
            _ => {
                log::warn!("⚠️ Profile ID 缺失或重复（{:?}），重新分配为 {}", raw_id, fresh);
                profile.id = fresh;
                used.insert(fresh);
                fresh += 1;
                changed = true;
            }
        }
    }
    changed
}

/// 从存储文档中读取 Profile 集合
pub fn migrate_collection(doc: &Value, template: &Profile, now_ms: i64) -> Option<MigratedCollection> {
    let from_version = detect_version(doc);
    let mut changed = from_version < SCHEMA_VERSION;

    let mut entries: Vec<(Option<i64>, Profile)> = match doc.get("profiles").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(|item| {
                let Some(obj) = item.as_object() else {
                    log::warn!("⚠️ 忽略无法识别的 Profile 条目: {}", item);
                    changed = true;
                    return None;
                };
                let (profile, backfilled) = migrate_fields(obj, template);
                changed |= backfilled;
                Some((obj.get("id").and_then(parse_id), profile))
            })
            .collect(),
        None if from_version == 1 => {
            let obj = doc.as_object()?;
            log::info!("📦 检测到 v1 扁平设置，转换为单个 Profile");
            let (profile, _) = migrate_fields(obj, template);
            let profile = Profile {
                name: template.name.clone(),
                ..profile
            };
            vec![(Some(template.id), profile)]
        }
        None => Vec::new(),
    };

    if entries.is_empty() {
        return None;
    }

    changed |= assign_unique_ids(&mut entries, now_ms);
    let profiles: Vec<Profile> = entries.into_iter().map(|(_, profile)| profile).collect();

    let stored_default = doc.get("defaultProfileId").and_then(parse_id);
    let default_profile_id = match stored_default {
        Some(id) if profiles.iter().any(|p| p.id == id) => id,
        _ => {
            let first = profiles[0].id;
            log::warn!("⚠️ 默认 Profile 指针无效（{:?}），改为 {}", stored_default, first);
            changed = true;
            first
        }
    };

    if from_version < SCHEMA_VERSION {
        log::info!("⬆️ Profile 存储格式 v{} → v{}", from_version, SCHEMA_VERSION);
    }

    Some(MigratedCollection {
        collection: ProfileCollection::from_parts(profiles, default_profile_id),
        from_version,
        changed,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn migrate(doc: Value) -> Option<MigratedCollection> {
        migrate_collection(&doc, &Profile::template(), 9_000)
    }

    #[test]
    fn empty_document_has_no_collection() {
        assert_eq!(detect_version(&json!({})), 0);
        assert!(migrate(json!({})).is_none());
        assert!(migrate(json!({"profiles": [], "theme": "dark"})).is_none());
    }

    #[test]
    fn current_document_reads_back_unchanged() {
        let stored = ProfileCollection::seeded(&Profile::template());
        let mut doc = serde_json::to_value(&stored).expect("serialize");
        doc["schemaVersion"] = json!(SCHEMA_VERSION);

        let migrated = migrate(doc).expect("collection");
        assert_eq!(migrated.collection, stored);
        assert!(!migrated.changed);
    }

    #[test]
    fn v2_profile_gets_new_fields_from_template() {
        let migrated = migrate(json!({
            "profiles": [{
                "id": 1000, "name": "Old", "incId": true, "incName": false, "incUrl": true,
                "sep": " - ", "prefix": "<", "suffix": ">", "urlPrefix": "", "urlSuffix": ""
            }],
            "defaultProfileId": 1000
        }))
        .expect("collection");

        let p = &migrated.collection.profiles()[0];
        assert_eq!(migrated.from_version, 2);
        assert!(migrated.changed);
        assert_eq!(p.name, "Old");
        assert!(!p.inc_name);
        assert!(p.is_clickable);
        assert!(p.replacements.is_empty());
        assert_eq!(p.separator, " - ");
    }

    #[test]
    fn v1_flat_settings_become_one_profile() {
        let migrated = migrate(json!({
            "incId": true, "incName": true, "incUrl": false,
            "sep": " :: ", "prefix": "(", "suffix": ")", "urlPrefix": "[", "urlSuffix": "]"
        }))
        .expect("collection");

        assert_eq!(migrated.from_version, 1);
        let c = &migrated.collection;
        assert_eq!(c.len(), 1);
        assert_eq!(c.default_profile_id(), 1000);
        let p = c.active_profile();
        assert_eq!(p.name, "Standard");
        assert!(!p.inc_url);
        assert_eq!(p.separator, " :: ");
        assert_eq!(p.url_prefix, "[");
    }

    #[test]
    fn missing_and_duplicate_ids_are_reassigned() {
        let migrated = migrate(json!({
            "schemaVersion": 3,
            "profiles": [
                {"id": 1000, "name": "A"},
                {"id": 1000, "name": "B"},
                {"name": "C"},
                {"id": "12000", "name": "D"}
            ],
            "defaultProfileId": 12000
        }))
        .expect("collection");

        let ids: Vec<i64> = migrated.collection.profiles().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1000, 12001, 12002, 12000]);
        assert_eq!(migrated.collection.default_profile_id(), 12000);
        assert!(migrated.changed);
    }

    #[test]
    fn stale_default_pointer_moves_to_first() {
        let migrated = migrate(json!({
            "profiles": [{"id": 1}, {"id": 2}],
            "defaultProfileId": 99
        }))
        .expect("collection");
        assert_eq!(migrated.collection.default_profile_id(), 1);
    }

    #[test]
    fn rules_with_unknown_target_are_dropped() {
        let migrated = migrate(json!({
            "schemaVersion": 3,
            "profiles": [{
                "id": 1, "name": "R", "incId": true, "incName": true, "incUrl": true,
                "isClickable": false, "sep": "|", "prefix": "", "suffix": "",
                "urlPrefix": "", "urlSuffix": "",
                "replacements": [
                    {"find": "a", "replace": "b", "target": "name"},
                    {"find": "c", "replace": "d", "target": "body"},
                    {"find": "e"}
                ]
            }],
            "defaultProfileId": 1
        }))
        .expect("collection");

        let rules = &migrated.collection.profiles()[0].replacements;
        assert_eq!(
            rules,
            &vec![
                ReplacementRule::new("a", "b", FieldTarget::Title),
                ReplacementRule::new("e", "", FieldTarget::Id),
            ]
        );
        assert!(migrated.changed);
    }
}
