//! What gets installed and configured

use crate::preferences::Style;

/// Base RPM packages every workstation gets
pub const SYSTEM_PACKAGES: &[&str] = &[
    "flatpak",
    "gnome-tweaks",
    "gnome-extensions-app",
    "dconf-editor",
    "git",
    "curl",
];

pub const FLATHUB_NAME: &str = "flathub";
pub const FLATHUB_URL: &str = "https://dl.flathub.org/repo/flathub.flatpakrepo";

/// Flatpak applications from Flathub
pub const FLATPAK_APPS: &[&str] = &[
    "com.mattjakeman.ExtensionManager",
    "com.github.tchx84.Flatseal",
    "org.gnome.Loupe",
];

/// A GNOME Shell extension and the package providing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension {
    pub package: &'static str,
    pub uuid: &'static str,
}

const APPINDICATOR: Extension = Extension {
    package: "gnome-shell-extension-appindicator",
    uuid: "appindicatorsupport@rgcjonas.gmail.com",
};

const BLUR_MY_SHELL: Extension = Extension {
    package: "gnome-shell-extension-blur-my-shell",
    uuid: "blur-my-shell@aunetx",
};

const DASH_TO_DOCK: Extension = Extension {
    package: "gnome-shell-extension-dash-to-dock",
    uuid: "dash-to-dock@micxgx.gmail.com",
};

const DASH_TO_PANEL: Extension = Extension {
    package: "gnome-shell-extension-dash-to-panel",
    uuid: "dash-to-panel@jderose9.github.com",
};

/// Extensions for a visual style: the common set plus a dock or a panel
pub fn extensions_for(style: Style) -> Vec<Extension> {
    let mut extensions = vec![APPINDICATOR, BLUR_MY_SHELL];
    match style {
        Style::Gnome => {}
        Style::Macos => extensions.push(DASH_TO_DOCK),
        Style::Windows => extensions.push(DASH_TO_PANEL),
    }
    extensions
}

pub const WALLPAPER_PACKAGES: &[&str] = &["gnome-backgrounds"];
pub const WALLPAPER_SCHEMA: &str = "org.gnome.desktop.background";
pub const WALLPAPER_URI: &str = "file:///usr/share/backgrounds/gnome/adwaita-l.jpg";
pub const WALLPAPER_URI_DARK: &str = "file:///usr/share/backgrounds/gnome/adwaita-d.jpg";

pub const WM_SCHEMA: &str = "org.gnome.desktop.wm.preferences";
pub const INTERFACE_SCHEMA: &str = "org.gnome.desktop.interface";
/// Holds `enabled-extensions`, readable without a running shell
pub const SHELL_SCHEMA: &str = "org.gnome.shell";

/// `/etc/default/grub` assignments that hide the boot menu
pub const GRUB_HIDDEN_MENU: &[(&str, &str)] = &[("GRUB_TIMEOUT", "0"), ("GRUB_TIMEOUT_STYLE", "hidden")];
