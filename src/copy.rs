//! 复制流程模块
//!
//! # 设计思路
//!
//! 一次用户触发对应一次完整流程：解析默认 Profile → 提取字段 → 规则替换与渲染 → 写入剪贴板。
//! 流程内部没有并行；提取与写入是两端的异步边界，中间的格式化是纯同步计算。
//!
//! # 实现思路
//!
//! - 提取方与发布方以 trait 注入，核心流程不关心页面与剪贴板的具体实现。
//! - 返回结果携带所用 Profile 的名称，供宿主展示"Copied: <name>"提示。

use serde::Serialize;

use crate::clipboard::ClipboardPublisher;
use crate::error::AppError;
use crate::extract::FieldExtractor;
use crate::format::{self, ClipboardPayload};
use crate::profile::ProfileCollection;

/// 一次复制的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyOutcome {
    pub profile_id: i64,
    pub profile_name: String,
    pub payload: ClipboardPayload,
}

impl CopyOutcome {
    /// 宿主展示的提示文本
    pub fn feedback(&self) -> String {
        format!("Copied: {}", self.profile_name)
    }
}

/// 使用集合中的默认 Profile 执行一次复制
pub async fn copy_ticket<E, P>(
    collection: &ProfileCollection,
    extractor: &E,
    publisher: &P,
) -> Result<CopyOutcome, AppError>
where
    E: FieldExtractor,
    P: ClipboardPublisher,
{
    let profile = collection.active_profile();
    let fields = extractor.extract().await?;
    log::debug!("🔍 提取字段 - id={:?} url={:?}", fields.id, fields.url);

    let payload = format::render(profile, &fields);
    publisher.publish(&payload).await?;

    log::info!("📋 已按 Profile「{}」复制 {}", profile.name, fields.id);
    Ok(CopyOutcome {
        profile_id: profile.id,
        profile_name: profile.name.clone(),
        payload,
    })
}
