//! TruthLens 深度伪造检测服务的客户端核心：会话、提交分析、仪表盘统计。

pub mod api;
pub mod config;
pub mod error;
pub mod evidence;
pub mod fingerprint;
pub mod loading;
pub mod session;
pub mod stats;
pub mod submitter;

pub use api::{DetectionApi, HttpDetectionApi};
pub use config::Config;
pub use error::{ApiError, ErrorKind, SubmissionError};
pub use evidence::{AnalysisResult, UploadRecord, UserProfile, Verdict};
pub use fingerprint::{MediaFile, SubmittedAnalysis};
pub use session::{NavItem, Navigation, Route, Session, SessionStore};
pub use stats::{AggregateStats, StatisticsReconciler, StatisticsView, StatsSource};
pub use submitter::{AnalysisSubmitter, SubmissionState};
