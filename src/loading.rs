use std::sync::atomic::{AtomicUsize, Ordering};

/// "正在请求中" 标志
///
/// 每个组件各持有一个，互不共享；这是外部唯一能观察到的并发信号。
/// 内部是在途请求计数，多个请求重叠时，只有最后一个结束才复位。
#[derive(Debug, Default)]
pub struct LoadingFlag(AtomicUsize);

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }

    /// 计数 +1，并返回一个在 drop 时 -1 的守卫
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.0.fetch_add(1, Ordering::SeqCst);
        LoadingGuard { flag: self }
    }
}

pub struct LoadingGuard<'a> {
    flag: &'a LoadingFlag,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.0.fetch_sub(1, Ordering::SeqCst);
    }
}
