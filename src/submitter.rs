use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::DetectionApi;
use crate::error::{ApiError, SubmissionError};
use crate::evidence::AnalysisResult;
use crate::fingerprint::{MediaFile, SubmittedAnalysis};
use crate::loading::LoadingFlag;

/// 提交状态机：`Idle -> Pending -> {Completed, Failed}`，`select_file` 从任何状态回到 `Idle`。
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Pending,
    Completed(SubmittedAnalysis),
    Failed(ApiError),
}

struct Inner {
    file: Option<MediaFile>,
    state: SubmissionState,
    /// 每次选文件 +1；请求返回时代数对不上就丢弃
    generation: u64,
}

/// 分析提交器 (Analysis Submitter)
///
/// 同一时刻最多保留一个结果。锁只保护本地状态，网络请求期间不持有锁，
/// 所以 UI 在请求进行中仍可以重新选文件。
pub struct AnalysisSubmitter {
    api: Arc<dyn DetectionApi>,
    inner: Mutex<Inner>,
    loading: LoadingFlag,
}

impl AnalysisSubmitter {
    pub fn new(api: Arc<dyn DetectionApi>) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner {
                file: None,
                state: SubmissionState::Idle,
                generation: 0,
            }),
            loading: LoadingFlag::new(),
        }
    }

    /// 记录新文件，并无条件清掉旧结果。
    /// 正在进行的请求不会被取消，它返回时会因为代数不匹配被丢弃。
    pub async fn select_file(&self, file: MediaFile) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.file = Some(file);
        inner.state = SubmissionState::Idle;
    }

    pub async fn submit(&self) -> Result<AnalysisResult, SubmissionError> {
        let (file, generation) = {
            let mut inner = self.inner.lock().await;
            let file = inner.file.clone().ok_or(SubmissionError::NoFileSelected)?;
            if inner.state == SubmissionState::Pending {
                return Err(SubmissionError::InFlight);
            }
            inner.state = SubmissionState::Pending;
            (file, inner.generation)
        };

        info!("📤 提交分析: {} ({} bytes, sha256={})", file.name, file.len(), file.sha256);
        let outcome = {
            let _loading = self.loading.begin();
            self.api.upload(&file).await
        };

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            info!("🗑️  丢弃过期结果: {}", file.name);
            return Err(SubmissionError::Superseded);
        }

        match outcome {
            Ok(result) => {
                info!(
                    "✅ 分析完成: {} -> {} ({})",
                    result.file_name, result.detection_result, result.confidence_score
                );
                inner.state = SubmissionState::Completed(SubmittedAnalysis::new(&file, result.clone()));
                Ok(result)
            }
            Err(err) => {
                warn!(kind = %err.kind(), "❌ 上传失败: {}", err);
                inner.state = SubmissionState::Failed(err.clone());
                Err(SubmissionError::Api(err))
            }
        }
    }

    /// 当前可展示的结果（只有 Completed 才有）
    pub async fn result(&self) -> Option<SubmittedAnalysis> {
        match &self.inner.lock().await.state {
            SubmissionState::Completed(analysis) => Some(analysis.clone()),
            _ => None,
        }
    }

    pub async fn state(&self) -> SubmissionState {
        self.inner.lock().await.state.clone()
    }

    pub async fn selected_file(&self) -> Option<MediaFile> {
        self.inner.lock().await.file.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }
}
