//! 字段提取模块
//!
//! # 设计思路
//!
//! 页面抓取属于外部协作方：核心流程只依赖 `FieldExtractor` 的输出契约
//! `{id, title, url}`。本模块给出一个基于页面快照（地址 + 标题文本）的实现，
//! DOM 选择器与页面类型判断留给宿主。
//!
//! # 实现思路
//!
//! - 工单编号优先从地址中解析（`/browse/KEY`、`/projects/P/issues/KEY`、`selectedIssue=KEY`），
//!   解析不到时使用宿主给出的候选值。
//! - 有编号时把链接规整为 `origin/browse/KEY`，去掉查询条件等噪声。
//! - 正则通过 `once_cell::sync::Lazy` 在首次调用时编译，后续零成本复用。

use std::future::Future;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;
use crate::ticket::TicketFields;

/// 地址中的工单编号模式，按优先级排列
static ISSUE_KEY_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"/browse/([A-Z0-9-]+)").unwrap(),
        Regex::new(r"/projects/[^/]+/issues/([A-Z0-9-]+)").unwrap(),
        Regex::new(r"selectedIssue=([A-Z0-9-]+)").unwrap(),
    ]
});

const TITLE_SUFFIX: &str = " - Jira";

/// 字段提取方
///
/// 提取可能跨越页面上下文，因此是异步的。
pub trait FieldExtractor {
    fn extract(&self) -> impl Future<Output = Result<TicketFields, AppError>> + Send;
}

/// 宿主采集到的页面快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    /// 页面当前地址
    pub url: String,
    /// 页面上的标题元素文本
    #[serde(default)]
    pub summary: Option<String>,
    /// `document.title`
    #[serde(default)]
    pub document_title: Option<String>,
    /// 侧栏等位置显示的工单编号
    #[serde(default)]
    pub key_hint: Option<String>,
}

/// 从地址中解析工单编号
pub fn issue_key_from_url(url: &str) -> Option<String> {
    ISSUE_KEY_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 规整后的工单链接；无法解析来源时原样返回页面地址
pub fn clean_issue_url(page_url: &str, key: &str) -> String {
    if key.is_empty() {
        return page_url.to_string();
    }
    match Url::parse(page_url) {
        Ok(parsed) if parsed.origin().is_tuple() => {
            format!("{}/browse/{}", parsed.origin().ascii_serialization(), key)
        }
        _ => {
            log::debug!("无法解析页面来源，保留原地址: {}", page_url);
            page_url.to_string()
        }
    }
}

fn normalize_summary(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = Some(title.into());
        self
    }

    pub fn with_key_hint(mut self, key: impl Into<String>) -> Self {
        self.key_hint = Some(key.into());
        self
    }

    /// 同步完成字段提取
    pub fn extract_fields(&self) -> Result<TicketFields, AppError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(AppError::MissingField("url"));
        }

        let id = issue_key_from_url(url)
            .or_else(|| {
                self.key_hint
                    .as_deref()
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        let title = self
            .summary
            .as_deref()
            .map(normalize_summary)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.document_title.as_deref().map(|t| {
                    let t = t.trim();
                    t.strip_suffix(TITLE_SUFFIX).unwrap_or(t).trim().to_string()
                })
            })
            .unwrap_or_default();

        if id.is_empty() {
            log::warn!("⚠️ 未能从页面中识别工单编号: {}", url);
        }

        Ok(TicketFields {
            url: clean_issue_url(url, &id),
            id,
            title,
        })
    }
}

impl FieldExtractor for PageSnapshot {
    fn extract(&self) -> impl Future<Output = Result<TicketFields, AppError>> + Send {
        std::future::ready(self.extract_fields())
    }
}
