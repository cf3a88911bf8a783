//! # 认证与授权模块
//!
//! 登录失败锁定、会话与登录状态守卫、权限解析、密码哈希以及组合它们的登录流程

pub mod login;
pub mod login_lock;
pub mod password;
pub mod permission;
pub mod session;
pub mod users;

pub use login::{LoginOutcome, LoginRequest, LoginService};
pub use login_lock::{LockState, LoginFailureLock};
pub use password::PasswordHasher;
pub use permission::PermissionResolver;
pub use session::{CacheSessionStore, CaptchaChallenge, LoginStateGuard, Session, SessionState};
pub use users::UserService;
