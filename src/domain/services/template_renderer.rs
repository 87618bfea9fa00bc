// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::contact::Contact;
use crate::domain::models::email_template::EmailTemplate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder pattern is valid")
});

/// 渲染后的邮件内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
    pub plain_text_body: String,
}

/// 模板渲染器
///
/// 最小化的模板语言：把 `{{key}}` 替换为变量值，没有条件、循环或转义。
pub struct TemplateRenderer;

impl TemplateRenderer {
    /// 替换模板中所有 `{{key}}` 占位符
    ///
    /// 单次扫描，替换进来的值不会被再次展开；未知的占位符原样保留。
    pub fn substitute(template: &str, variables: &HashMap<&str, &str>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
                Some(value) => (*value).to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// 以联系人变量分别渲染主题、HTML 正文和纯文本正文
    pub fn render(template: &EmailTemplate, contact: &Contact) -> RenderedEmail {
        let variables = contact.template_variables();
        RenderedEmail {
            subject: Self::substitute(&template.subject, &variables),
            html_body: Self::substitute(&template.html_body, &variables),
            plain_text_body: Self::substitute(&template.plain_text_body, &variables),
        }
    }
}

#[cfg(test)]
#[path = "template_renderer_test.rs"]
mod tests;
