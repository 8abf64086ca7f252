//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，调用方（编辑界面、复制流程）只需处理一种错误类型。
//! 用户手写的规则写错不会走到这里：规则引擎在本地跳过无效规则，不向上抛出。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ProfileError`、`RuleError`、`std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于宿主界面直接展示。

use serde::Serialize;

use crate::profile::ProfileError;
use crate::rules::RuleError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Profile 管理错误（删除最后一个 / 引用不存在的 ID）
    #[error("{0}")]
    Profile(#[from] ProfileError),

    /// 规则校验失败，仅在显式校验时出现
    #[error("{0}")]
    Rule(#[from] RuleError),

    /// 页面抓取结果缺少必需字段
    #[error("缺少字段: {0}")]
    MissingField(&'static str),

    /// 页面抓取失败
    #[error("字段提取失败: {0}")]
    Extraction(String),

    /// 剪贴板读写操作失败
    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    /// 设置文件不可用
    #[error("存储不可用: {0}")]
    Storage(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_errors_convert_and_serialize_as_text() {
        let err: AppError = ProfileError::LastProfile.into();
        assert!(matches!(err, AppError::Profile(ProfileError::LastProfile)));

        let json = serde_json::to_string(&AppError::from(ProfileError::UnknownProfile(7)))
            .expect("serialize");
        assert_eq!(json, "\"Profile 不存在: 7\"");
    }
}
