pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod prompts;
pub mod server;
pub mod settings;
pub mod telemetry;
pub mod vin;
pub mod vision;

/**
 * \brief SDK 预导入集合，方便外部引用常用模块。
 */
pub mod prelude {
    pub use crate::config;
    pub use crate::db;
    pub use crate::email;
    pub use crate::error;
    pub use crate::models;
    pub use crate::prompts;
    pub use crate::server;
    pub use crate::settings;
    pub use crate::telemetry;
    pub use crate::vin;
    pub use crate::vision;
}
