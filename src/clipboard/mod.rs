//! 剪贴板发布模块
//!
//! # 设计思路
//!
//! 格式化结果最终交给剪贴板发布方写入系统剪贴板。核心流程只依赖
//! `ClipboardPublisher` 契约，测试中可替换为内存实现。
//!
//! # 实现思路
//!
//! - `ArboardPublisher` 基于 `arboard`：有 HTML 时写入 HTML 并以纯文本作为备选格式，
//!   否则只写纯文本。
//! - 剪贴板被其他进程占用时按指数退避 + 抖动重试，总耗时受预算约束（见 `writer`）。
//! - 写入在 `spawn_blocking` 线程中执行，不阻塞异步运行时。

mod writer;

use std::future::Future;

use crate::error::AppError;
use crate::format::ClipboardPayload;

pub use writer::PublishConfig;

/// 剪贴板发布方
pub trait ClipboardPublisher {
    fn publish(&self, payload: &ClipboardPayload) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// 写入系统剪贴板
#[derive(Debug, Clone, Default)]
pub struct ArboardPublisher {
    config: PublishConfig,
}

impl ArboardPublisher {
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }
}

impl ClipboardPublisher for ArboardPublisher {
    fn publish(&self, payload: &ClipboardPayload) -> impl Future<Output = Result<(), AppError>> + Send {
        let payload = payload.clone();
        let config = self.config.clone();

        async move {
            log::debug!(
                "📋 准备写入剪贴板 - {} 字符, html={}",
                payload.plain_text.chars().count(),
                payload.html.is_some()
            );

            tokio::task::spawn_blocking(move || writer::write_with_retry(&payload, &config))
                .await
                .map_err(|e| AppError::Clipboard(format!("线程执行失败：{}", e)))?
        }
    }
}
