// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 邮件发送错误，仅以字符串描述
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EmailError(pub String);

/// 邮件发送特质
///
/// 定义单封邮件发送的核心逻辑
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// 发送邮件
    ///
    /// # 参数
    ///
    /// * `to` - 收件人地址
    /// * `subject` - 主题
    /// * `html_body` - HTML 正文
    /// * `text_body` - 纯文本正文
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 发送成功
    /// * `Err(EmailError)` - 发送失败
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError>;
}
