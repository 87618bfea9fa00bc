// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// HTTP 请求与响应的数据传输对象
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 活动、联系人、模板等业务实体，仓库接口与领域服务
pub mod domain;

/// 基础设施模块
///
/// 数据库、SMTP 发送与指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器和租户提取器
pub mod presentation;

/// 队列模块
///
/// 活动调度循环
pub mod queue;

/// 工具模块
///
/// 日志初始化
pub mod utils;

/// 工作器模块
///
/// 活动执行器与后台任务管理
pub mod workers;
