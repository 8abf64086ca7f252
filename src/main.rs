//! # 工单链接复制工具 — 应用入口
//!
//! 本文件仅负责日志初始化、设置加载与组件装配。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。
//!
//! 用法：`copy-ticket <页面地址> [标题]`

use copy_ticket::clipboard::{ArboardPublisher, PublishConfig};
use copy_ticket::copy::copy_ticket;
use copy_ticket::error::AppError;
use copy_ticket::extract::PageSnapshot;
use copy_ticket::settings::SettingsStore;
use copy_ticket::storage::{self, DATA_DIR_ENV};

async fn run(url: String, summary: Option<String>) -> Result<String, AppError> {
    let path = storage::settings_file_path(std::env::var(DATA_DIR_ENV).ok())?;
    let store = SettingsStore::open(path)?;
    log::info!("setup: settings loaded from {}", store.path().display());

    let mut snapshot = PageSnapshot::new(url);
    if let Some(summary) = summary {
        snapshot = snapshot.with_summary(summary);
    }

    let publisher = ArboardPublisher::new(PublishConfig::for_short_lived_process());
    let outcome = copy_ticket(&store.collection()?, &snapshot, &publisher).await?;
    Ok(outcome.feedback())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("用法: copy-ticket <页面地址> [标题]");
        std::process::exit(2);
    };
    let summary = args.next();

    match run(url, summary).await {
        Ok(feedback) => println!("{feedback}"),
        Err(err) => {
            log::error!("复制失败: {err}");
            std::process::exit(1);
        }
    }
}
