// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：活动、投递日志、后台作业等业务实体
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：模板渲染、邮件发送与通知接口
/// - 用例（use_cases）：具体的业务操作和流程
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod repositories;
pub mod services;
pub mod use_cases;
