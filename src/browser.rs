use log::{info, warn};
use std::process::Command;

/// Open `url` in the platform's default browser.
///
/// - macOS: `open`
/// - Windows: `start`
/// - Linux: `xdg-open`
pub fn open_browser(url: &str) {
    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => info!("Opened browser at {}", url),
        Err(e) => warn!("Failed to open browser: {}", e),
    }
}
