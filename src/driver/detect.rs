//! Discovery of installed browser builds at well-known locations.
//!
//! A build is only reported when its executable actually exists on disk.
//! The order in which targets are pushed here is the configuration order
//! and therefore the column order of every result file.

use std::path::PathBuf;

use super::{BrowserFamily, BrowserTarget};

/// Probe the host platform for installed browsers and resolve versions
/// where that is cheap to do.
pub async fn detect_browsers() -> Vec<BrowserTarget> {
    let mut targets = detect_at_known_paths();
    for target in &mut targets {
        if target.version.is_none() {
            target.version = query_exe_version(target).await;
        }
    }
    log::info!("Detected browsers:");
    for target in &targets {
        log::info!("{}: {}", target.label(), target.exe.display());
    }
    targets
}

fn detect_at_known_paths() -> Vec<BrowserTarget> {
    let mut found = Found(Vec::new());
    if cfg!(target_os = "windows") {
        windows_targets(&mut found);
    } else if cfg!(target_os = "macos") {
        macos_targets(&mut found);
    } else {
        linux_targets(&mut found);
    }
    found.0
}

struct Found(Vec<BrowserTarget>);

impl Found {
    fn add(&mut self, name: &str, path: PathBuf, family: BrowserFamily) {
        if self.0.iter().any(|t| t.name == name) {
            return;
        }
        if path.is_file() {
            self.0.push(BrowserTarget::new(name, path, family));
        }
    }
}

fn windows_targets(found: &mut Found) {
    let local_appdata = std::env::var("LOCALAPPDATA").ok().map(PathBuf::from);
    let program_files = std::env::var("ProgramFiles").ok().map(PathBuf::from);
    let program_files_x86 = std::env::var("ProgramFiles(x86)").ok().map(PathBuf::from);
    let roots: Vec<&PathBuf> = [&program_files, &program_files_x86, &local_appdata]
        .into_iter()
        .flatten()
        .collect();

    for channel in ["Chrome", "Chrome Beta"] {
        for root in &roots {
            found.add(
                channel,
                root.join("Google").join(channel).join("Application").join("chrome.exe"),
                BrowserFamily::Chromium,
            );
        }
    }
    for (name, dir) in [
        ("Firefox", "Mozilla Firefox"),
        ("Firefox", "Firefox"),
        ("Firefox ESR", "Mozilla Firefox ESR"),
        ("Firefox Beta", "Mozilla Firefox Beta"),
        ("Firefox Beta", "Firefox Beta"),
    ] {
        for root in [&program_files, &program_files_x86].into_iter().flatten() {
            found.add(name, root.join(dir).join("firefox.exe"), BrowserFamily::Firefox);
        }
    }
    for channel in ["Edge", "Edge Dev"] {
        for root in &roots {
            found.add(
                &format!("Microsoft {} (Chromium)", channel),
                root.join("Microsoft").join(channel).join("Application").join("msedge.exe"),
                BrowserFamily::Chromium,
            );
        }
    }
    if let Some(local) = &local_appdata {
        found.add(
            "Microsoft Edge Canary (Chromium)",
            local.join("Microsoft").join("Edge SxS").join("Application").join("msedge.exe"),
            BrowserFamily::Chromium,
        );
    }
    for root in [&program_files, &program_files_x86].into_iter().flatten() {
        found.add(
            "Brave",
            root.join("BraveSoftware").join("Brave-Browser").join("Application").join("brave.exe"),
            BrowserFamily::Chromium,
        );
    }
}

fn linux_targets(found: &mut Found) {
    found.add("Chrome", "/opt/google/chrome/chrome".into(), BrowserFamily::Chromium);
    found.add("Chrome Beta", "/opt/google/chrome-beta/chrome".into(), BrowserFamily::Chromium);
    found.add("Firefox", "/usr/lib/firefox/firefox".into(), BrowserFamily::Firefox);
    found.add("Firefox", "/usr/bin/firefox".into(), BrowserFamily::Firefox);
    found.add("Firefox ESR", "/usr/lib/firefox-esr/firefox-esr".into(), BrowserFamily::Firefox);
    found.add("Brave", "/opt/brave.com/brave/brave-browser".into(), BrowserFamily::Chromium);
    found.add("Microsoft Edge", "/usr/bin/microsoft-edge-stable".into(), BrowserFamily::Chromium);
    found.add("Microsoft Edge Beta", "/usr/bin/microsoft-edge-beta".into(), BrowserFamily::Chromium);
    found.add("Microsoft Edge Dev", "/usr/bin/microsoft-edge-dev".into(), BrowserFamily::Chromium);
}

fn macos_targets(found: &mut Found) {
    found.add(
        "Chrome",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".into(),
        BrowserFamily::Chromium,
    );
    found.add(
        "Chrome Beta",
        "/Applications/Google Chrome Beta.app/Contents/MacOS/Google Chrome Beta".into(),
        BrowserFamily::Chromium,
    );
    found.add(
        "Firefox",
        "/Applications/Firefox.app/Contents/MacOS/firefox".into(),
        BrowserFamily::Firefox,
    );
    found.add(
        "Safari",
        "/Applications/Safari.app/Contents/MacOS/Safari".into(),
        BrowserFamily::Safari,
    );
}

/// Best-effort `--version` probe so result headers can carry a version
/// suffix. Safari has no version flag; its version is recorded from the
/// live session instead.
async fn query_exe_version(target: &BrowserTarget) -> Option<String> {
    if target.family == BrowserFamily::Safari {
        return None;
    }
    let output = tokio::process::Command::new(&target.exe)
        .arg("--version")
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_version_output(&String::from_utf8_lossy(&output.stdout))
}

/// `--version` output looks like "Google Chrome 126.0.6478.55" or
/// "Mozilla Firefox 127.0"; take the first dotted numeric token.
fn parse_version_output(text: &str) -> Option<String> {
    text.split_whitespace()
        .find(|token| {
            token.contains('.')
                && token.chars().next().is_some_and(|c| c.is_ascii_digit())
                && token.chars().all(|c| c.is_ascii_digit() || c == '.')
        })
        .map(|token| token.to_string())
}
