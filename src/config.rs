use std::env;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// 检测服务的统一源地址（不带结尾的 `/`）
    pub api_url: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = env::var("TRUTHLENS_API_URL").unwrap_or_else(|_| {
            info!("TRUTHLENS_API_URL 未设置，使用默认值: {}", DEFAULT_API_URL);
            DEFAULT_API_URL.to_string()
        });

        let timeout = parse_timeout(env::var("TRUTHLENS_TIMEOUT_SECS").ok().as_deref())?;

        Ok(Self::new(api_url, timeout))
    }

    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_url: normalize(api_url.into()),
            timeout,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = normalize(api_url.into());
        self
    }

    /// 拼接 `/api/...` 路径
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

/// 未设置时用默认值；0 秒会让每个请求立刻超时，直接拒绝
fn parse_timeout(raw: Option<&str>) -> anyhow::Result<Duration> {
    let timeout_secs = match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("TRUTHLENS_TIMEOUT_SECS must be a number, got {raw:?}"))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    anyhow::ensure!(timeout_secs > 0, "TRUTHLENS_TIMEOUT_SECS must be greater than 0");
    Ok(Duration::from_secs(timeout_secs))
}

fn normalize(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
