//! 格式化模块
//!
//! # 设计思路
//!
//! 把规则引擎的输出与 Profile 的结构设置拼装为最终的剪贴板内容：
//! 纯文本 + 可选的 HTML 超链接。"工单信息块"与"链接块"是两个可独立开关的片段，
//! 直接拼接，中间不插入分隔符。
//!
//! # 实现思路
//!
//! - 纯同步、无 I/O，可脱离异步环境单独测试。
//! - 显示文本使用替换后的字段；超链接目标始终使用未经替换的原始 URL。
//! - 纯文本为空时不生成 HTML，空结果是合法输出而不是错误。

use serde::{Deserialize, Serialize};

use crate::profile::Profile;
use crate::rules;
use crate::ticket::TicketFields;

/// 预览使用的示例字段
pub const SAMPLE_ID: &str = "PROJ-123";
pub const SAMPLE_TITLE: &str = "Example Issue Summary";
pub const SAMPLE_URL: &str = "https://your-domain.atlassian.net/browse/PROJ-123";

/// 交给剪贴板发布方的内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardPayload {
    pub plain_text: String,
    /// 仅在 Profile 开启 `is_clickable` 时存在
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl ClipboardPayload {
    pub fn is_empty(&self) -> bool {
        self.plain_text.is_empty() && self.html.is_none()
    }
}

fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// 按 Profile 渲染一次格式化请求
///
/// `fields.url` 视为规范链接：它既是 URL 替换规则的输入，也是超链接的目标。
/// 超链接的 href 与文字做 HTML 实体转义（`&` → `&amp;` 等），不是原样拼接；
/// 浏览器解析后的链接地址与原样拼接一致。
pub fn render(profile: &Profile, fields: &TicketFields) -> ClipboardPayload {
    let transformed = rules::apply(&profile.replacements, fields);

    let mut info: Vec<&str> = Vec::with_capacity(2);
    if profile.inc_id && !transformed.id.is_empty() {
        info.push(&transformed.id);
    }
    if profile.inc_name && !transformed.title.is_empty() {
        info.push(&transformed.title);
    }
    let text_part = info.join(profile.separator.as_str());

    let bracketed = if text_part.is_empty() {
        String::new()
    } else {
        format!("{}{}{}", profile.prefix, text_part, profile.suffix)
    };

    let url_segment = if profile.inc_url {
        format!("{}{}{}", profile.url_prefix, transformed.url, profile.url_suffix)
    } else {
        String::new()
    };

    let plain_text = bracketed + &url_segment;

    let html = if profile.is_clickable && !plain_text.is_empty() {
        let label = if text_part.is_empty() {
            transformed.id.as_str()
        } else {
            text_part.as_str()
        };
        Some(format!(
            "<a href=\"{}\">{}</a>",
            html_escape(&fields.url),
            html_escape(label)
        ))
    } else {
        None
    };

    log::debug!(
        "📝 渲染完成 - profile={} plain={}字符 html={}",
        profile.id,
        plain_text.chars().count(),
        html.is_some()
    );

    ClipboardPayload { plain_text, html }
}

/// 用示例字段渲染，供设置界面实时预览
pub fn preview(profile: &Profile) -> ClipboardPayload {
    render(profile, &TicketFields::new(SAMPLE_ID, SAMPLE_TITLE, SAMPLE_URL))
}
