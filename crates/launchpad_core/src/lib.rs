pub mod config;
pub mod logging;
pub mod notifications;
pub mod session;

pub use config::{ContractAddresses, ContractValidation, LaunchpadConfig, Network, validate_url};
pub use notifications::{AppNotification, NotificationStore, NotificationType};
pub use session::SessionState;
