//! 工单字段模块
//!
//! # 设计思路
//!
//! 页面抓取的结果只有三个字段：编号、标题、规范链接。
//! 这里定义它们的值类型，以及替换规则用来指明"作用于哪个字段"的枚举，
//! 用显式的字段访问替代按字符串 key 动态取值。
//!
//! # 实现思路
//!
//! - `TicketFields` 为纯值类型，格式化流程按值传入、按值产出。
//! - `FieldTarget` 的序列化名称沿用历史存储格式：标题字段写作 `"name"`，
//!   读取时同时接受 `"title"`。

use serde::{Deserialize, Serialize};

/// 一次格式化请求的原始字段
///
/// 字段允许为空字符串：抓取失败时核心流程降级输出，而不是报错。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFields {
    pub id: String,
    pub title: String,
    pub url: String,
}

impl TicketFields {
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
        }
    }

    /// 读取指定字段
    pub fn get(&self, target: FieldTarget) -> &str {
        match target {
            FieldTarget::Id => &self.id,
            FieldTarget::Title => &self.title,
            FieldTarget::Url => &self.url,
        }
    }

    /// 取得指定字段的可变引用
    pub fn get_mut(&mut self, target: FieldTarget) -> &mut String {
        match target {
            FieldTarget::Id => &mut self.id,
            FieldTarget::Title => &mut self.title,
            FieldTarget::Url => &mut self.url,
        }
    }
}

/// 替换规则作用的字段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTarget {
    #[default]
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "name", alias = "title")]
    Title,
    #[serde(rename = "url")]
    Url,
}

impl FieldTarget {
    /// 从存储中的字符串解析；未知取值返回 `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "id" => Some(Self::Id),
            "name" | "title" => Some(Self::Title),
            "url" => Some(Self::Url),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "name",
            Self::Url => "url",
        }
    }
}
