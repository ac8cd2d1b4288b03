use crate::config::PublishDefaults;
use std::fmt;

/// Per-platform switches requested on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformFlags {
    pub xhs: bool,
    pub bilibili: bool,
    pub douyin: bool,
    pub shipinhao: bool,
    pub y2b: bool,
}

impl PlatformFlags {
    pub fn any(&self) -> bool {
        self.xhs || self.bilibili || self.douyin || self.shipinhao || self.y2b
    }
}

/// Platforms a bundle is sent to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishTargets {
    pub xhs: bool,
    pub bilibili: bool,
    pub douyin: bool,
    pub shipinhao: bool,
    pub y2b: bool,
}

impl PublishTargets {
    /// Explicit flags win over configured defaults; `no_pub` turns
    /// everything off.
    pub fn resolve(flags: PlatformFlags, defaults: PublishDefaults, no_pub: bool) -> Self {
        if no_pub {
            return Self::default();
        }
        if flags.any() {
            return Self {
                xhs: flags.xhs,
                bilibili: flags.bilibili,
                douyin: flags.douyin,
                shipinhao: flags.shipinhao,
                y2b: flags.y2b,
            };
        }
        Self {
            xhs: defaults.xhs,
            bilibili: defaults.bilibili,
            douyin: defaults.douyin,
            shipinhao: defaults.shipinhao,
            y2b: defaults.y2b,
        }
    }

    fn enabled(&self) -> Vec<&'static str> {
        [
            ("xhs", self.xhs),
            ("bilibili", self.bilibili),
            ("douyin", self.douyin),
            ("shipinhao", self.shipinhao),
            ("y2b", self.y2b),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }
}

impl fmt::Display for PublishTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enabled = self.enabled();
        if enabled.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&enabled.join(", "))
        }
    }
}
