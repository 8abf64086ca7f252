//! 剪贴板写入子模块
//!
//! ## 职责
//! - 在阻塞线程中执行一次剪贴板写入（HTML + 纯文本，或仅纯文本）
//! - 剪贴板被占用时按指数退避 + 抖动重试，总耗时不超过预算
//! - 平台不支持或格式转换失败属于不可重试错误，立即终止
//! - Linux 上可选择持有剪贴板内容，直到其他程序接管（短生命周期进程使用）
//!
//! ## 输入/输出
//! - 输入：`ClipboardPayload`、`PublishConfig`
//! - 输出：`Result<(), AppError>`
//!
//! ## 错误语义
//! - 重试耗尽或遇到不可重试错误统一映射为 `AppError::Clipboard`

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::error::AppError;
use crate::format::ClipboardPayload;

/// 剪贴板写入重试策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    /// 最大尝试次数（至少 1 次）
    pub retries: u32,
    /// 首次重试前的基础等待（毫秒）
    pub retry_delay_ms: u64,
    /// 单次写入流程允许的总重试预算（毫秒）
    pub retry_max_total_ms: u64,
    /// 单次退避延迟上限（毫秒）
    pub retry_max_delay_ms: u64,
    /// 写入后阻塞到其他程序接管剪贴板（仅 Linux 生效）
    ///
    /// X11 / Wayland 下剪贴板内容由写入进程提供，进程退出即丢失。
    pub hold_until_replaced: bool,
}

impl PublishConfig {
    /// 写完即退出的进程使用的配置
    pub fn for_short_lived_process() -> Self {
        Self {
            hold_until_replaced: true,
            ..Self::default()
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay_ms: 100,
            retry_max_total_ms: 1_800,
            retry_max_delay_ms: 900,
            hold_until_replaced: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    Busy,
    Transient,
    Fatal,
}

#[derive(Debug, Clone)]
struct WriteFailure {
    kind: FailureKind,
    message: String,
}

impl WriteFailure {
    fn busy(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Busy,
            message: message.into(),
        }
    }

    fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fatal,
            message: message.into(),
        }
    }

    fn from_arboard(context: &str, err: arboard::Error) -> Self {
        let message = format!("{}：{}", context, err);
        match err {
            arboard::Error::ClipboardOccupied => Self::busy(message),
            arboard::Error::ClipboardNotSupported | arboard::Error::ConversionFailure => Self::fatal(message),
            _ => Self::transient(message),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self.kind, FailureKind::Busy | FailureKind::Transient)
    }
}

static JITTER_STATE: AtomicU64 = AtomicU64::new(0);

fn seed_jitter_state() -> u64 {
    let time_seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let state = time_seed ^ ((std::process::id() as u64) << 32) ^ 0x9E37_79B9_7F4A_7C15;
    if state == 0 { 0xA5A5_5A5A_0123_4567 } else { state }
}

fn next_jitter_u64() -> u64 {
    let mut current = JITTER_STATE.load(Ordering::Relaxed);

    loop {
        let mut next = if current == 0 { seed_jitter_state() } else { current };
        next ^= next << 13;
        next ^= next >> 7;
        next ^= next << 17;

        match JITTER_STATE.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => current = observed,
        }
    }
}

fn compute_backoff_delay(base_delay_ms: u64, attempt: u32, max_delay_ms: u64) -> u64 {
    let exp = base_delay_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(8));
    let capped = exp.min(max_delay_ms.max(base_delay_ms));
    let jitter_bound = (capped / 3).max(1);
    let jitter = next_jitter_u64() % (jitter_bound + 1);
    capped.saturating_add(jitter)
}

fn would_exceed_budget(elapsed_ms: u64, wait_ms: u64, budget_ms: u64) -> bool {
    elapsed_ms.saturating_add(wait_ms) > budget_ms
}

#[cfg(target_os = "linux")]
fn set_payload(
    clipboard: &mut arboard::Clipboard,
    payload: &ClipboardPayload,
    hold_until_replaced: bool,
) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;

    let set = if hold_until_replaced {
        log::info!("⏳ 等待其他程序接管剪贴板");
        clipboard.set().wait()
    } else {
        clipboard.set()
    };
    match &payload.html {
        Some(html) => set.html(html.as_str(), Some(payload.plain_text.as_str())),
        None => set.text(payload.plain_text.as_str()),
    }
}

#[cfg(not(target_os = "linux"))]
fn set_payload(
    clipboard: &mut arboard::Clipboard,
    payload: &ClipboardPayload,
    _hold_until_replaced: bool,
) -> Result<(), arboard::Error> {
    match &payload.html {
        Some(html) => clipboard.set_html(html.as_str(), Some(payload.plain_text.as_str())),
        None => clipboard.set_text(payload.plain_text.as_str()),
    }
}

fn try_write(payload: &ClipboardPayload, hold_until_replaced: bool) -> Result<(), WriteFailure> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| WriteFailure::from_arboard("无法访问剪贴板", e))?;

    set_payload(&mut clipboard, payload, hold_until_replaced)
        .map_err(|e| WriteFailure::from_arboard("写入剪贴板失败", e))
}

/// 阻塞执行写入 + 重试
pub(super) fn write_with_retry(payload: &ClipboardPayload, config: &PublishConfig) -> Result<(), AppError> {
    run_with_retry(config, || try_write(payload, config.hold_until_replaced))
}

fn run_with_retry<F>(config: &PublishConfig, mut attempt_write: F) -> Result<(), AppError>
where
    F: FnMut() -> Result<(), WriteFailure>,
{
    let retry_count = config.retries.max(1);
    let started = Instant::now();
    let mut last_error = None;

    for attempt in 1..=retry_count {
        if attempt > 1 {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let wait_ms = compute_backoff_delay(
                config.retry_delay_ms.max(1),
                attempt - 1,
                config.retry_max_delay_ms,
            );

            if would_exceed_budget(elapsed_ms, wait_ms, config.retry_max_total_ms) {
                log::warn!(
                    "⏱️ 跳过第 {} 次重试：等待 {}ms 会超过预算 {}ms",
                    attempt,
                    wait_ms,
                    config.retry_max_total_ms
                );
                break;
            }

            log::debug!("🔄 重试 {}/{}，等待 {}ms", attempt, retry_count, wait_ms);
            std::thread::sleep(Duration::from_millis(wait_ms));
        }

        match attempt_write() {
            Ok(()) => {
                log::info!("✅ 已写入剪贴板 (尝试 {})", attempt);
                return Ok(());
            }
            Err(failure) => {
                let retryable = failure.is_retryable();
                log::warn!(
                    "❌ 尝试 {} 失败: {}（kind={:?}, retryable={}）",
                    attempt,
                    failure.message,
                    failure.kind,
                    retryable
                );
                last_error = Some(failure.message);

                if !retryable {
                    log::warn!("🛑 非可重试错误，提前终止重试");
                    break;
                }
            }
        }
    }

    Err(AppError::Clipboard(
        last_error.unwrap_or_else(|| "未知错误".to_string()),
    ))
}
