use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::evidence::{AnalysisResult, UploadRecord, UserProfile};
use crate::fingerprint::MediaFile;
use crate::stats::AggregateStats;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const CURRENT_USER_PATH: &str = "/api/auth/me";
pub const UPLOAD_PATH: &str = "/api/upload";
pub const ADMIN_STATS_PATH: &str = "/api/admin/stats";
pub const HISTORY_PATH: &str = "/api/uploads";

// ==========================================
// 1. 检测服务契约 (Request/Response Contract)
// ==========================================
// 三个客户端组件只通过这个 trait 和外部服务打交道。
// 授权凭证由实现方隐式携带（浏览器里的 cookie），调用方看不到。
#[async_trait]
pub trait DetectionApi: Send + Sync {
    /// POST /api/auth/login，成功时凭证在带外建立
    async fn login(&self, email: &str, password: &str) -> Result<()>;

    /// POST /api/upload，单文件 multipart
    async fn upload(&self, file: &MediaFile) -> Result<AnalysisResult>;

    /// GET /api/admin/stats，仅特权用户可用
    async fn admin_stats(&self) -> Result<AggregateStats>;

    /// GET /api/uploads，当前用户自己的上传历史
    async fn list_uploads(&self) -> Result<Vec<UploadRecord>>;

    /// GET /api/uploads，只数条数。
    /// 统计降级只需要长度，记录长什么样都不应该让这一步失败。
    async fn count_uploads(&self) -> Result<usize> {
        self.list_uploads().await.map(|records| records.len())
    }

    /// GET /api/auth/me
    async fn current_user(&self) -> Result<UserProfile>;
}

// ==========================================
// 2. DTOs
// ==========================================

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

// ==========================================
// 3. HTTP 实现
// ==========================================

/// 基于 reqwest 的实现。
///
/// 内部 `Client` 开启了 cookie store：登录响应里的 `session_token` cookie 会被记住，
/// 之后的所有请求自动带上。整个进程共用这一份凭证存储。
#[derive(Clone)]
pub struct HttpDetectionApi {
    client: Client,
    config: Config,
}

impl HttpDetectionApi {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.config.endpoint(path);
        debug!("➡️  GET {}", url);
        let response = self.client.get(&url).send().await?;
        decode(check(response)?).await
    }
}

/// 非 2xx 一律转成错误
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        debug!("⬅️  {} {}", status, response.url());
        Err(ApiError::from_status(status))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::transport(format!("undecodable response body: {e}")))
}

#[async_trait]
impl DetectionApi for HttpDetectionApi {
    async fn login(&self, email: &str, password: &str) -> Result<()> {
        let url = self.config.endpoint(LOGIN_PATH);
        debug!("➡️  POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        check(response)?;
        Ok(())
    }

    async fn upload(&self, file: &MediaFile) -> Result<AnalysisResult> {
        let url = self.config.endpoint(UPLOAD_PATH);
        debug!("➡️  POST {} ({}, {} bytes)", url, file.name, file.len());

        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ApiError::transport(format!("invalid content type: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        decode(check(response)?).await
    }

    async fn admin_stats(&self) -> Result<AggregateStats> {
        self.get_json(ADMIN_STATS_PATH).await
    }

    async fn list_uploads(&self) -> Result<Vec<UploadRecord>> {
        self.get_json(HISTORY_PATH).await
    }

    async fn count_uploads(&self) -> Result<usize> {
        let records: Vec<IgnoredAny> = self.get_json(HISTORY_PATH).await?;
        Ok(records.len())
    }

    async fn current_user(&self) -> Result<UserProfile> {
        self.get_json(CURRENT_USER_PATH).await
    }
}

// ==========================================
// 4. 测试替身
// ==========================================
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Semaphore;

    /// 按脚本返回结果、并记录每次调用的假服务
    pub(crate) struct FakeApi {
        pub login: Mutex<Result<()>>,
        pub uploads: Mutex<VecDeque<Result<AnalysisResult>>>,
        pub admin: Mutex<Result<AggregateStats>>,
        pub history: Mutex<Result<Vec<UploadRecord>>>,
        pub me: Mutex<Result<UserProfile>>,
        /// 设置后，login / upload / list_uploads 会卡住直到测试放行一个许可
        pub gate: Option<Arc<Semaphore>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Default for FakeApi {
        fn default() -> Self {
            let down = || ApiError::transport("connection refused");
            Self {
                login: Mutex::new(Ok(())),
                uploads: Mutex::new(VecDeque::new()),
                admin: Mutex::new(Err(ApiError::Auth { status: 403 })),
                history: Mutex::new(Err(down())),
                me: Mutex::new(Err(ApiError::Auth { status: 401 })),
                gate: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl FakeApi {
        pub fn gated(gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, name: &str) -> usize {
            self.calls().iter().filter(|c| **c == name).count()
        }

        /// 等到 `name` 被调用满 `n` 次；带闸门时意味着这些调用都已卡在闸门前
        pub async fn wait_for(&self, name: &str, n: usize) {
            while self.count(name) < n {
                tokio::task::yield_now().await;
            }
        }

        fn record(&self, name: &'static str) {
            self.calls.lock().unwrap().push(name);
        }

        async fn pass_gate(&self) {
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
        }
    }

    pub(crate) fn history_of(n: usize) -> Vec<UploadRecord> {
        (0..n)
            .map(|i| {
                serde_json::from_value(serde_json::json!({ "upload_id": format!("upload_{i}") }))
                    .unwrap()
            })
            .collect()
    }

    pub(crate) fn verdict_for(file_name: &str) -> AnalysisResult {
        serde_json::from_value(serde_json::json!({
            "detection_result": "fake",
            "confidence_score": 0.87,
            "file_name": file_name,
        }))
        .unwrap()
    }

    #[async_trait]
    impl DetectionApi for FakeApi {
        async fn login(&self, _email: &str, _password: &str) -> Result<()> {
            self.record("login");
            self.pass_gate().await;
            self.login.lock().unwrap().clone()
        }

        async fn upload(&self, file: &MediaFile) -> Result<AnalysisResult> {
            self.record("upload");
            self.pass_gate().await;
            self.uploads
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(verdict_for(&file.name)))
        }

        async fn admin_stats(&self) -> Result<AggregateStats> {
            self.record("admin_stats");
            self.admin.lock().unwrap().clone()
        }

        async fn list_uploads(&self) -> Result<Vec<UploadRecord>> {
            self.record("list_uploads");
            self.pass_gate().await;
            self.history.lock().unwrap().clone()
        }

        async fn current_user(&self) -> Result<UserProfile> {
            self.record("current_user");
            self.me.lock().unwrap().clone()
        }
    }
}
