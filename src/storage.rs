//! 数据目录管理模块
//!
//! # 设计思路
//!
//! 统一管理设置文件的存放路径，支持用户自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用用户指定的自定义目录（通常来自环境变量 `COPY_TICKET_DATA_DIR`）。
//! - 未设置时回退到系统数据目录下的 `copy-ticket` 子目录。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fs;
use std::path::PathBuf;

use crate::error::AppError;

/// 自定义数据目录的环境变量名
pub const DATA_DIR_ENV: &str = "COPY_TICKET_DATA_DIR";
const APP_DIR_NAME: &str = "copy-ticket";
const SETTINGS_FILE_NAME: &str = "settings.json";

fn resolve_data_dir(custom_dir: Option<String>, system_dir: Option<PathBuf>) -> Result<PathBuf, AppError> {
    // 优先使用用户自定义目录
    if let Some(dir) = custom_dir {
        if !dir.trim().is_empty() {
            let path = PathBuf::from(&dir);
            if !path.exists() {
                fs::create_dir_all(&path).map_err(|e| {
                    AppError::Storage(format!("创建自定义目录 '{}' 失败: {}", dir, e))
                })?;
            }
            return Ok(path);
        }
    }

    let base = system_dir.ok_or_else(|| AppError::Storage("获取系统数据目录失败".to_string()))?;
    let data_dir = base.join(APP_DIR_NAME);
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)
            .map_err(|e| AppError::Storage(format!("创建数据目录失败: {}", e)))?;
    }
    Ok(data_dir)
}

/// 获取数据目录
///
/// # 参数
/// * `custom_dir` - 用户自定义目录（可选）
///
/// # 返回
/// - `Ok(PathBuf)` — 可用的数据目录
/// - `Err(AppError::Storage)` — 无法获取或创建目录
pub fn get_data_dir(custom_dir: Option<String>) -> Result<PathBuf, AppError> {
    resolve_data_dir(custom_dir, dirs::data_dir())
}

/// 设置文件的完整路径
pub fn settings_file_path(custom_dir: Option<String>) -> Result<PathBuf, AppError> {
    Ok(get_data_dir(custom_dir)?.join(SETTINGS_FILE_NAME))
}
