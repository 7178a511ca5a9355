//! # 后端服务
//!
//! 独立目录服务及其依赖的插件环境组件

pub mod catalog;
pub mod discovery;
pub mod permission;
pub mod standalone;
pub mod token;

pub use discovery::{HostDiscovery, PluginEndpointDiscovery};
pub use permission::{AuthorizeResult, ServerPermissionClient};
pub use standalone::{ServerOptions, create_standalone_router, start_standalone_server};
pub use token::ServerTokenManager;
