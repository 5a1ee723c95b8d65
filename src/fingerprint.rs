use sha2::{Digest, Sha256};
use std::path::Path;

use crate::evidence::AnalysisResult;

/// 用户选中的待分析文件
///
/// 客户端不做大小 / 类型校验，原样交给检测服务判断。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// 文件内容的 SHA256 (小写 Hex)，用来把结果和请求配对
    pub sha256: String,
}

impl MediaFile {
    /// 从内存字节构造。MIME 类型按扩展名猜测，猜不出时用 `application/octet-stream`。
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let sha256 = sha256_hex(&bytes);
        Self {
            name,
            content_type,
            bytes,
            sha256,
        }
    }

    /// 从磁盘读取。文件名取路径的最后一段。
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// 一次完成的分析：结果 + 产生它的那份文件的指纹。
/// 结果脱离了对应的请求就没有意义。
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedAnalysis {
    pub file_name: String,
    pub fingerprint: String,
    pub result: AnalysisResult,
}

impl SubmittedAnalysis {
    pub fn new(file: &MediaFile, result: AnalysisResult) -> Self {
        Self {
            file_name: file.name.clone(),
            fingerprint: file.sha256.clone(),
            result,
        }
    }

    pub fn matches(&self, file: &MediaFile) -> bool {
        self.fingerprint == file.sha256
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sha256_of_known_input() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn content_type_is_guessed_from_extension() {
        assert_eq!(MediaFile::from_bytes("face.png", vec![1]).content_type, "image/png");
        assert_eq!(MediaFile::from_bytes("clip.mp4", vec![1]).content_type, "video/mp4");
        assert_eq!(
            MediaFile::from_bytes("mystery", vec![1]).content_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn open_reads_name_and_bytes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portrait.jpg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not really a jpeg").unwrap();
        drop(file);

        let media = MediaFile::open(&path).await.unwrap();
        assert_eq!(media.name, "portrait.jpg");
        assert_eq!(media.content_type, "image/jpeg");
        assert_eq!(media.len(), 17);
        assert_eq!(media.sha256, sha256_hex(b"not really a jpeg"));
    }

    #[tokio::test]
    async fn open_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MediaFile::open(&dir.path().join("gone.png")).await.is_err());
    }
}
