pub mod chat;
pub mod sessions;
pub mod settings;
pub mod shared;
pub mod training;

pub use chat::ChatView;
pub use sessions::SessionsView;
pub use settings::SettingsView;
pub use training::TrainingView;
