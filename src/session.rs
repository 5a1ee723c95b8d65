use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::api::DetectionApi;
use crate::error::{ApiError, Result};
use crate::evidence::UserProfile;
use crate::loading::LoadingFlag;

/// 会话 (Session)
///
/// 客户端对"我是否已登录"的认知，不是密码学凭证。真正的授权由服务端通过不透明的
/// 会话凭证完成，所以两者可能不一致（比如服务端会话已过期），这是已知且接受的性质。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(email: impl Into<String>) -> Self {
        Self {
            identity: Some(email.into()),
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// 仪表盘标题
    pub fn greeting(&self) -> String {
        match &self.identity {
            Some(email) => format!("Welcome, {email}"),
            None => "Welcome".to_string(),
        }
    }
}

/// 页面区域。登录成功进入已认证区，登出总是回到登录页。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Upload,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Upload => "/upload",
            Route::Dashboard => "/dashboard",
        }
    }
}

// ==========================================
// 会话仓库 (Session Store)
// ==========================================
// 整个进程里唯一写会话的地方；其他组件拿 `session()` 的快照。
pub struct SessionStore {
    api: Arc<dyn DetectionApi>,
    session: RwLock<Session>,
    loading: LoadingFlag,
}

impl SessionStore {
    pub fn new(api: Arc<dyn DetectionApi>) -> Self {
        Self {
            api,
            session: RwLock::new(Session::anonymous()),
            loading: LoadingFlag::new(),
        }
    }

    /// 登录
    ///
    /// 邮箱或密码为空时直接本地拒绝，不发请求。失败时保留原有会话不变；
    /// "密码错误" 和 "服务不可达" 在错误类型上区分，但提示文本相同（见 [`crate::error::login_alert`]）。
    pub async fn login(&self, email: &str, password: &str) -> Result<Route> {
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("email and password are both required"));
        }

        let _loading = self.loading.begin();
        match self.api.login(email, password).await {
            Ok(()) => {
                *self.session.write().await = Session::authenticated(email);
                info!("🔑 登录成功: {}", email);
                Ok(Route::Dashboard)
            }
            Err(err) => {
                warn!(kind = %err.kind(), "⛔ 登录失败: {}", err);
                Err(err)
            }
        }
    }

    /// 登出：只清本地会话，幂等。
    pub async fn logout(&self) -> Route {
        let previous = std::mem::take(&mut *self.session.write().await);
        if let Some(email) = previous.identity() {
            info!("👋 已登出: {}", email);
        }
        Route::Login
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    /// 向服务端确认当前身份 (GET /api/auth/me)
    ///
    /// 只在调用方显式要求时执行。服务端明确拒绝 (Auth) 时清掉本地认知；
    /// 网络错误不动本地会话。
    pub async fn refresh_identity(&self) -> Result<UserProfile> {
        match self.api.current_user().await {
            Ok(profile) => {
                *self.session.write().await = Session::authenticated(profile.email.clone());
                Ok(profile)
            }
            Err(err) if err.is_auth() => {
                warn!("⌛ 服务端会话已失效，清除本地登录状态");
                *self.session.write().await = Session::anonymous();
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

/// 导航栏上的一个入口
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavItem {
    Link { label: &'static str, route: Route },
    Logout,
}

pub struct Navigation;

impl Navigation {
    pub fn for_session(session: &Session) -> Vec<NavItem> {
        let mut items = vec![
            NavItem::Link {
                label: "Upload",
                route: Route::Upload,
            },
            NavItem::Link {
                label: "History",
                route: Route::Dashboard,
            },
        ];
        if session.is_authenticated() {
            items.push(NavItem::Logout);
        } else {
            items.push(NavItem::Link {
                label: "Get Started",
                route: Route::Login,
            });
        }
        items
    }
}
