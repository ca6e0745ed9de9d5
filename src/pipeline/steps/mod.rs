//! The provisioning steps, in pipeline order

pub mod appearance;
pub mod apps;
pub mod bootloader;
pub mod extensions;
pub mod packages;
pub mod remote;
pub mod wallpaper;
