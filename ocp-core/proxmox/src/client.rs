//! Proxmox 客户端核心实现

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ocp_common::Outcome;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ProxmoxError, Result};

/// 防跨站请求伪造头（CSRFPreventionToken，头名称大小写不敏感）
const CSRF_HEADER: &str = "csrfpreventiontoken";

/// 认证 Cookie 名称
const AUTH_COOKIE: &str = "PVEAuthCookie";

/// Proxmox 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxmoxConfig {
    /// 连接超时（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// 请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// 是否验证 SSL 证书
    ///
    /// 默认关闭：Proxmox 部署在可信内网，使用自签名证书。
    #[serde(default)]
    pub verify_ssl: bool,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ProxmoxConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            verify_ssl: false,
        }
    }
}

/// 登录凭据
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 登录获得的认证票据
#[derive(Clone)]
struct AuthTicket {
    ticket: String,
    csrf_token: String,
}

/// Proxmox 客户端
///
/// 一个实例对应一次认证会话，票据只保存在内存中，不自动刷新，也不在请求之间共享。
pub struct ProxmoxClient {
    /// API 基础 URL（例如 `https://pve:8006/api2/json`）
    base_url: String,

    /// HTTP 客户端
    http_client: Client,

    /// 登录凭据
    credentials: Credentials,

    /// 认证票据
    ticket: RwLock<Option<AuthTicket>>,

    /// 配置
    config: ProxmoxConfig,
}

impl ProxmoxClient {
    /// 创建新的 Proxmox 客户端
    pub fn new(base_url: &str, credentials: Credentials, config: ProxmoxConfig) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(ProxmoxError::ConfigError("Proxmox URL 不能为空".to_string()));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ProxmoxError::HttpError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            credentials,
            ticket: RwLock::new(None),
            config,
        })
    }

    /// 认证登录
    ///
    /// 成功后票据作为 Cookie、CSRF token 作为请求头附加到之后的所有请求。
    ///
    /// # Arguments
    /// * `path` - 登录接口路径，通常为 [`crate::paths::LOGIN_PATH`]
    pub async fn login(&self, path: &str) -> Outcome<serde_json::Value> {
        info!("Proxmox 客户端登录: {}", self.credentials.username);

        match self.login_internal(path).await {
            Ok(data) => {
                info!("Proxmox 客户端登录成功");
                Ok(data)
            }
            Err(e) => {
                warn!("Proxmox 登录失败: {}", e);
                Err(e.into())
            }
        }
    }

    async fn login_internal(&self, path: &str) -> Result<serde_json::Value> {
        let url = self.url(path);
        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
        ];

        let response = self.http_client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ProxmoxError::HttpError(e.to_string()))?;

        let data = Self::read_data(response).await?;

        let ticket = data["ticket"]
            .as_str()
            .ok_or_else(|| ProxmoxError::AuthError("未获取到 ticket".to_string()))?
            .to_string();
        let csrf_token = data["CSRFPreventionToken"]
            .as_str()
            .ok_or_else(|| ProxmoxError::AuthError("未获取到 CSRFPreventionToken".to_string()))?
            .to_string();

        *self.ticket.write().await = Some(AuthTicket { ticket, csrf_token });
        Ok(data)
    }

    /// 注销：丢弃内存中的票据
    pub async fn logout(&self) {
        if self.ticket.write().await.take().is_some() {
            info!("Proxmox 客户端登出");
        }
    }

    /// 是否已登录
    pub async fn is_authenticated(&self) -> bool {
        self.ticket.read().await.is_some()
    }

    /// 在一次认证会话内执行操作
    ///
    /// 先登录，再执行 `f`，无论 `f` 成功与否都会登出；登录失败时直接返回登录错误。
    /// 若返回的 future 被中途丢弃，客户端随之释放，票据不会遗留。
    ///
    /// # Example
    /// ```ignore
    /// let vms = client
    ///     .with_session(paths::LOGIN_PATH, |c| async move { c.list_vms("/nodes/pve1/qemu").await })
    ///     .await?;
    /// ```
    pub async fn with_session<T, F, Fut>(self, login_path: &str, f: F) -> Outcome<T>
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let client = Arc::new(self);

        if let Err(e) = client.login(login_path).await {
            client.logout().await;
            return Err(e);
        }

        let outcome = f(Arc::clone(&client)).await;
        client.logout().await;
        outcome
    }

    /// 统一请求执行器
    ///
    /// 成功返回响应中的 `data` 字段；非 2xx 为上游错误（状态码透传）；其他失败为传输错误。
    pub(crate) async fn execute<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Outcome<serde_json::Value> {
        self.request(method.clone(), path, body).await.map_err(|e| {
            warn!("Proxmox 请求失败: {} {} - {}", method, path, e);
            e.into()
        })
    }

    /// 发送 HTTP 请求
    async fn request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<serde_json::Value> {
        let url = self.url(path);
        debug!("Proxmox API 请求: {} {}", method, url);

        let headers = self.auth_headers().await?;

        let mut request = self.http_client
            .request(method, &url)
            .headers(headers);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await
            .map_err(|e| ProxmoxError::HttpError(e.to_string()))?;

        Self::read_data(response).await
    }

    /// 检查状态码并提取 `data` 字段
    async fn read_data(response: reqwest::Response) -> Result<serde_json::Value> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "无法读取错误响应".to_string());
            return Err(ProxmoxError::ApiError(status.as_u16(), error_text));
        }

        let mut body: serde_json::Value = response.json().await
            .map_err(|e| ProxmoxError::ParseError(e.to_string()))?;

        Ok(body
            .get_mut("data")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null))
    }

    async fn auth_headers(&self) -> Result<HeaderMap> {
        let guard = self.ticket.read().await;
        let ticket = guard.as_ref()
            .ok_or_else(|| ProxmoxError::AuthError("未认证，请先登录".to_string()))?;

        let mut headers = HeaderMap::new();
        let cookie = HeaderValue::from_str(&format!("{}={}", AUTH_COOKIE, ticket.ticket))
            .map_err(|e| ProxmoxError::AuthError(format!("ticket 格式非法: {}", e)))?;
        let csrf = HeaderValue::from_str(&ticket.csrf_token)
            .map_err(|e| ProxmoxError::AuthError(format!("CSRF token 格式非法: {}", e)))?;
        headers.insert(COOKIE, cookie);
        headers.insert(CSRF_HEADER, csrf);
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 获取配置
    pub fn config(&self) -> &ProxmoxConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ProxmoxClient::new(
            "https://192.168.1.10:8006/api2/json/",
            Credentials::new("root@pam", "secret"),
            ProxmoxConfig::default(),
        );
        let client = client.unwrap();
        assert_eq!(client.base_url(), "https://192.168.1.10:8006/api2/json");
        assert!(!client.config().verify_ssl);
    }

    #[test]
    fn test_empty_url_rejected() {
        let client = ProxmoxClient::new("  ", Credentials::new("u", "p"), ProxmoxConfig::default());
        assert!(matches!(client, Err(ProxmoxError::ConfigError(_))));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("root@pam", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("root@pam"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_not_authenticated_before_login() {
        let client = ProxmoxClient::new(
            "https://127.0.0.1:8006/api2/json",
            Credentials::new("root@pam", "secret"),
            ProxmoxConfig::default(),
        )
        .unwrap();
        assert!(!client.is_authenticated().await);
        assert!(matches!(client.auth_headers().await, Err(ProxmoxError::AuthError(_))));
    }
}
