use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// 判定结果 (Verdict)
///
/// 检测服务给出的分类标签。未知标签原样保留在 `Other` 里，不会因为服务端新增一种结论就解析失败。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    Real,
    Fake,
    AiGenerated,
    Unknown,
    /// 服务端分析本身出错
    Error,
    Other(String),
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Real => "real",
            Verdict::Fake => "fake",
            Verdict::AiGenerated => "ai_generated",
            Verdict::Unknown => "unknown",
            Verdict::Error => "error",
            Verdict::Other(label) => label,
        }
    }
}

impl From<String> for Verdict {
    fn from(label: String) -> Self {
        match label.as_str() {
            "real" => Verdict::Real,
            "fake" => Verdict::Fake,
            "ai_generated" | "ai-generated" => Verdict::AiGenerated,
            "unknown" => Verdict::Unknown,
            "error" => Verdict::Error,
            _ => Verdict::Other(label),
        }
    }
}

impl From<Verdict> for String {
    fn from(verdict: Verdict) -> Self {
        verdict.as_str().to_string()
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 上传分析的回执
// ==========================================
// `/api/upload` 返回整条上传记录；这里只有前三个字段是必需的，其余按需保留。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub detection_result: Verdict,
    /// 置信度，取值范围由服务端决定
    pub confidence_score: f64,
    /// 回显的提交文件名
    pub file_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flagged: bool,
}

/// 当前用户的一条历史上传记录，所有字段都宽松解析。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    #[serde(default)]
    pub upload_id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default = "unknown_verdict")]
    pub detection_result: Verdict,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flagged: bool,
}

fn unknown_verdict() -> Verdict {
    Verdict::Unknown
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Other(IgnoredAny),
}

/// 时间戳解析失败不算错，记为 `None`
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawTimestamp>::deserialize(deserializer)? {
        Some(RawTimestamp::Text(text)) => parse_timestamp(&text),
        Some(RawTimestamp::Other(_)) | None => None,
    })
}

/// RFC3339；不带时区的 ISO 时间按 UTC 处理
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// `/api/auth/me` 的响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}
