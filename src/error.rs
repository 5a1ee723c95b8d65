use reqwest::StatusCode;
use thiserror::Error;

// ==========================================
// 1. 错误分类 (Error Taxonomy)
// ==========================================
// 每一次网络操作内部都返回带标签的错误；对用户展示时再统一折叠成一句话。

/// 错误种类，仅供日志 / 遥测使用，不影响用户看到的提示文本。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Transport,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Auth => "auth",
            ErrorKind::Transport => "transport",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 本地输入缺失，请求根本没有发出
    #[error("validation failed: {0}")]
    Validation(String),

    /// 登录被拒，或者当前会话没有权限访问该接口
    #[error("not authorized (HTTP {status})")]
    Auth { status: u16 },

    /// 服务不可达、超时、非 2xx 响应、响应体无法解析
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// 非成功状态码 -> 错误。401/403 归为 Auth，其余一律 Transport。
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth {
                status: status.as_u16(),
            },
            other => Self::Transport(format!("unexpected status {}", other)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::from_status(status),
            None => Self::Transport(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

// ==========================================
// 2. 提交分析的错误
// ==========================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("a submission for this file is already in flight")]
    InFlight,

    /// 请求返回时用户已经换了文件，这个结果被丢弃
    #[error("submission superseded by a newer file selection")]
    Superseded,

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub const FILL_CREDENTIALS_ALERT: &str = "Enter email and password";
pub const LOGIN_FAILED_ALERT: &str =
    "Login failed. Make sure backend is running and credentials are correct.";
pub const CHOOSE_FILE_ALERT: &str = "Please choose a file first";
pub const UPLOAD_FAILED_ALERT: &str =
    "Upload failed. Make sure you are logged in and the backend is running.";

/// 登录失败时展示给用户的提示。Auth 与 Transport 故意不区分。
pub fn login_alert(err: &ApiError) -> &'static str {
    match err {
        ApiError::Validation(_) => FILL_CREDENTIALS_ALERT,
        ApiError::Auth { .. } | ApiError::Transport(_) => LOGIN_FAILED_ALERT,
    }
}

impl SubmissionError {
    /// 阻塞式提示文本；过期结果静默丢弃，不打扰用户。
    pub fn alert(&self) -> Option<&'static str> {
        match self {
            Self::NoFileSelected => Some(CHOOSE_FILE_ALERT),
            Self::Superseded => None,
            Self::InFlight | Self::Api(_) => Some(UPLOAD_FAILED_ALERT),
        }
    }
}
