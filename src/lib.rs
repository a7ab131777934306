pub mod api;
pub mod audio;
pub mod emotion;
pub mod settings;
pub mod store;
pub mod theme;
pub mod types;

#[cfg(any(feature = "web", feature = "desktop", feature = "mobile"))]
pub mod ui;
#[cfg(any(feature = "web", feature = "desktop", feature = "mobile"))]
pub mod views;
