// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域用例模块
///
/// 该模块包含具体的业务用例实现，每个用例代表一个完整的业务流程。
///
/// 当前的用例：
/// - 创建活动（create_campaign）：校验目标、模板与调度设置后创建活动
pub mod create_campaign;
