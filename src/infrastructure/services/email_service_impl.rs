// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SmtpSettings;
use crate::domain::services::email_service::{EmailError, EmailSender};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// SMTP 邮件发送实现
///
/// STARTTLS 连接到中继服务器，正文以 multipart/alternative 发送
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// 根据 SMTP 配置创建发送器
    ///
    /// # 参数
    ///
    /// * `settings` - 已完整配置的 SMTP 设置
    ///
    /// # 返回值
    ///
    /// * `Ok(SmtpEmailSender)` - 发送器
    /// * `Err(EmailError)` - 配置缺失或发件人地址无效
    pub fn new(settings: &SmtpSettings) -> Result<Self, EmailError> {
        let (Some(host), Some(user), Some(password), Some(from)) = (
            settings.host.as_deref(),
            settings.user.as_deref(),
            settings.password.as_deref(),
            settings.from.as_deref(),
        ) else {
            return Err(EmailError("SMTP not configured".to_string()));
        };

        let from: Mailbox = from
            .parse()
            .map_err(|e| EmailError(format!("Invalid sender address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| EmailError(format!("Failed to create SMTP transport: {}", e)))?
            .port(settings.port)
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), EmailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| EmailError(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text_body.to_string(),
                html_body.to_string(),
            ))
            .map_err(|e| EmailError(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

/// 未配置 SMTP 时使用的发送器，只记录日志并视为成功
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyEmailSender;

#[async_trait]
impl EmailSender for LogOnlyEmailSender {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        _html_body: &str,
        _text_body: &str,
    ) -> Result<(), EmailError> {
        info!(to = %to, subject = %subject, "SMTP not configured - logging only");
        Ok(())
    }
}

/// 按配置选择发送器
///
/// SMTP 配置不完整或传输创建失败时退化为只记录日志
pub fn build_email_sender(settings: &SmtpSettings) -> Arc<dyn EmailSender> {
    if !settings.is_configured() {
        warn!("SMTP not configured, emails will only be logged");
        return Arc::new(LogOnlyEmailSender);
    }

    match SmtpEmailSender::new(settings) {
        Ok(sender) => {
            info!(
                "SMTP email sender configured for {}:{}",
                settings.host.as_deref().unwrap_or_default(),
                settings.port
            );
            Arc::new(sender)
        }
        Err(e) => {
            warn!("{}, emails will only be logged", e);
            Arc::new(LogOnlyEmailSender)
        }
    }
}
