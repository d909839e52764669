pub mod config;
pub mod errors;
pub mod setup;

pub use config::{AppConfig, ConfigError, InstallCredentials, LoadOptions};
pub use errors::{ApplicationError, InterfaceError};
pub use setup::{
    run_post_deploy, DeploymentDetails, SecretPrompter, SetupError, SetupMode, SetupOptions,
    StageDeployment, StageVariable, StageVariableStore,
};
