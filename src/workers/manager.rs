// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::scheduler::CampaignScheduler;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 持有后台任务句柄，收到关闭信号后统一终止
pub struct WorkerManager {
    scheduler: Arc<CampaignScheduler>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(scheduler: Arc<CampaignScheduler>) -> Self {
        Self {
            scheduler,
            handles: Vec::new(),
        }
    }

    /// 启动后台任务
    ///
    /// 先对账上次进程遗留的 running 活动，再启动调度循环
    pub async fn start_workers(&mut self) {
        if let Err(e) = self.scheduler.reconcile_stuck_campaigns().await {
            error!("Failed to reconcile stuck campaigns: {}", e);
        }

        let handle = Arc::clone(&self.scheduler).start();
        self.handles.push(handle);
    }

    /// 等待关闭信号并关闭后台任务
    ///
    /// 已派发的活动执行不受影响，随运行时一起结束
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        self.shutdown();
    }

    /// 终止所有后台任务
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }

        info!("Workers shut down successfully");
    }
}
