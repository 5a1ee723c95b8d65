use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::DetectionApi;
use crate::error::ApiError;
use crate::loading::LoadingFlag;
use crate::session::Session;

/// `/api/admin/stats` 的响应。服务端多返回的 `total_users` / `flagged_count` 直接忽略。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_uploads: u64,
    pub real_count: u64,
    pub fake_count: u64,
    pub ai_generated_count: u64,
}

/// 统计数据来自哪一级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    /// 特权接口的一次完整快照
    Aggregate,
    /// 降级：只有总数，来自自己的上传历史条数
    OwnHistory,
    /// 两级都失败，全零
    Unavailable,
}

/// 仪表盘统计视图
///
/// 降级视图只填 `total_uploads`，三个分类计数保持 0，不会凭空编造；
/// `source` 让降级视图和完整视图始终可区分。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsView {
    pub total_uploads: u64,
    pub real_count: u64,
    pub fake_count: u64,
    pub ai_generated_count: u64,
    pub source: StatsSource,
}

impl StatisticsView {
    pub fn aggregate(stats: AggregateStats) -> Self {
        Self {
            total_uploads: stats.total_uploads,
            real_count: stats.real_count,
            fake_count: stats.fake_count,
            ai_generated_count: stats.ai_generated_count,
            source: StatsSource::Aggregate,
        }
    }

    pub fn from_history(count: usize) -> Self {
        Self {
            total_uploads: count as u64,
            source: StatsSource::OwnHistory,
            ..Self::zero()
        }
    }

    pub fn zero() -> Self {
        Self {
            total_uploads: 0,
            real_count: 0,
            fake_count: 0,
            ai_generated_count: 0,
            source: StatsSource::Unavailable,
        }
    }

    /// `(total, real, fake, ai_generated)`
    pub fn counts(&self) -> (u64, u64, u64, u64) {
        (
            self.total_uploads,
            self.real_count,
            self.fake_count,
            self.ai_generated_count,
        )
    }

    pub fn is_degraded(&self) -> bool {
        self.source != StatsSource::Aggregate
    }
}

/// 回退顺序：先试特权接口，再试自己的历史，最后是全零视图。
pub const FALLBACK_ORDER: [StatsSource; 2] = [StatsSource::Aggregate, StatsSource::OwnHistory];

// ==========================================
// 统计协调器 (Statistics Reconciler)
// ==========================================
// 不是重试，是能力探测：同一套 UI 同时服务管理员和普通用户，不需要显式角色字段。
// 代价是所有失败原因（无权限 / 网络 / 服务端错误）都落进同一个降级分支。
pub struct StatisticsReconciler {
    api: Arc<dyn DetectionApi>,
    loading: LoadingFlag,
}

impl StatisticsReconciler {
    pub fn new(api: Arc<dyn DetectionApi>) -> Self {
        Self {
            api,
            loading: LoadingFlag::new(),
        }
    }

    /// 每次都重新计算，不缓存；永远不会失败。
    pub async fn load(&self, session: &Session) -> StatisticsView {
        let _loading = self.loading.begin();
        let who = session.identity().unwrap_or("anonymous");

        // 各级严格串行：上一级确定失败后才尝试下一级
        for stage in FALLBACK_ORDER {
            match self.attempt(stage).await {
                Ok(view) => {
                    info!("📊 统计加载完成 ({}): {:?} via {:?}", who, view.counts(), stage);
                    return view;
                }
                Err(err) => {
                    debug!(kind = %err.kind(), "📉 {:?} 不可用 ({}): {}", stage, who, err);
                }
            }
        }

        warn!("📭 统计数据全部不可用 ({})，显示零值", who);
        StatisticsView::zero()
    }

    async fn attempt(&self, stage: StatsSource) -> Result<StatisticsView, ApiError> {
        match stage {
            StatsSource::Aggregate => self.api.admin_stats().await.map(StatisticsView::aggregate),
            StatsSource::OwnHistory => self
                .api
                .count_uploads()
                .await
                .map(StatisticsView::from_history),
            StatsSource::Unavailable => Ok(StatisticsView::zero()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }
}
