//! Option normalization.
//!
//! Turns raw flag values into a [`BuildOption`]. Normalization never fails:
//! anything unrecognised falls back to its default and is logged.

use serde::Serialize;

/// Build type selected with `--type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Client,
    Server,
    Web,
    Weex,
}

impl BuildType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "client" => Some(Self::Client),
            "server" => Some(Self::Server),
            "web" => Some(Self::Web),
            "weex" => Some(Self::Weex),
            _ => None,
        }
    }
}

/// Bundle size report flavour selected with `--size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeAnalyzer {
    Analyzer,
    Stats,
}

impl SizeAnalyzer {
    /// `stats` selects the stats report; every other value means the analyzer.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("stats") {
            Self::Stats
        } else {
            Self::Analyzer
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyzer => "analyzer",
            Self::Stats => "stats",
        }
    }
}

/// Whether missing dependencies must be installed, and with which package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallCheck {
    pub check: bool,
    pub npm: String,
}

/// Flag values as they arrive from the command line.
///
/// Booleans are `Option` so that "not given" stays distinguishable from an
/// explicit `false`.
#[derive(Debug, Clone, Default)]
pub struct RawFlags {
    pub build_type: Option<String>,
    pub watch: Option<bool>,
    pub hash: Option<bool>,
    pub compress: Option<bool>,
    pub shorthand: Option<String>,
    pub port: Option<String>,
    pub devtool: Option<String>,
    pub size: Option<String>,
    pub only_dll: bool,
    pub only_web: bool,
    pub only_node: bool,
    pub strict: bool,
    /// Package manager for an install check; `None` means no check.
    pub install_mode: Option<String>,
}

/// Normalized build options consumed by the assembler and the pipelines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildOption {
    pub build_type: Option<BuildType>,
    pub watch: bool,
    pub hash_assets: bool,
    pub compress: bool,
    /// `None` when the user did not pass `--port`.
    pub port: Option<u16>,
    pub devtool: Option<String>,
    pub only_dll: bool,
    pub only_web: bool,
    pub only_node: bool,
    pub size_analyzer: Option<SizeAnalyzer>,
    pub install_check: Option<InstallCheck>,
    pub strict: bool,
}

impl BuildOption {
    pub fn has_target_filter(&self) -> bool {
        self.only_dll || self.only_web || self.only_node
    }
}

/// Boolean triad decoded from a shorthand string such as `"wmc"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shorthand {
    pub watch: bool,
    pub hash_assets: bool,
    pub compress: bool,
}

/// Decode a shorthand string. Order and repetition do not matter; unknown
/// characters are ignored.
pub fn decode_shorthand(value: &str) -> Shorthand {
    value.chars().fold(Shorthand::default(), |mut acc, ch| {
        match ch {
            'w' => acc.watch = true,
            'm' => acc.hash_assets = true,
            'c' => acc.compress = true,
            _ => {}
        }
        acc
    })
}

pub fn normalize(raw: &RawFlags) -> BuildOption {
    let shorthand = raw
        .shorthand
        .as_deref()
        .map(decode_shorthand)
        .unwrap_or_default();

    let build_type = raw.build_type.as_deref().and_then(|value| {
        let parsed = BuildType::parse(value);
        if parsed.is_none() {
            tracing::warn!("Ignoring unknown build type '{value}'");
        }
        parsed
    });

    let port = raw.port.as_deref().and_then(|value| match value.trim().parse::<u16>() {
        Ok(port) => Some(port),
        Err(_) => {
            tracing::warn!("Ignoring invalid port '{value}'");
            None
        }
    });

    let install_check = raw.install_mode.as_ref().map(|npm| InstallCheck {
        check: true,
        npm: npm.clone(),
    });

    BuildOption {
        build_type,
        watch: raw.watch.unwrap_or(shorthand.watch),
        hash_assets: raw.hash.unwrap_or(shorthand.hash_assets),
        compress: raw.compress.unwrap_or(shorthand.compress),
        port,
        devtool: raw.devtool.clone(),
        only_dll: raw.only_dll,
        only_web: raw.only_web,
        only_node: raw.only_node,
        size_analyzer: raw.size.as_deref().map(SizeAnalyzer::parse),
        install_check,
        strict: raw.strict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_matches_character_presence() {
        let alphabet = ['w', 'm', 'c'];
        // every subset, in both orders, with a duplicated first character
        for mask in 0u8..8 {
            let chars: Vec<char> = alphabet
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, c)| *c)
                .collect();
            let forward: String = chars.iter().collect();
            let mut backward: String = chars.iter().rev().collect();
            if let Some(first) = chars.first() {
                backward.push(*first);
            }
            let expected = Shorthand {
                watch: mask & 1 != 0,
                hash_assets: mask & 2 != 0,
                compress: mask & 4 != 0,
            };
            assert_eq!(decode_shorthand(&forward), expected, "{forward}");
            assert_eq!(decode_shorthand(&backward), expected, "{backward}");
        }
    }

    #[test]
    fn shorthand_ignores_unknown_characters() {
        assert_eq!(
            decode_shorthand("xwz-"),
            Shorthand {
                watch: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn explicit_flags_override_shorthand() {
        let raw = RawFlags {
            shorthand: Some("c".into()),
            watch: Some(true),
            ..Default::default()
        };
        let option = normalize(&raw);
        assert!(option.watch);
        assert!(option.compress);
        assert!(!option.hash_assets);

        let raw = RawFlags {
            shorthand: Some("wmc".into()),
            compress: Some(false),
            ..Default::default()
        };
        let option = normalize(&raw);
        assert!(option.watch && option.hash_assets);
        assert!(!option.compress);
    }

    #[test]
    fn port_is_left_unset_when_absent() {
        assert_eq!(normalize(&RawFlags::default()).port, None);
        let raw = RawFlags {
            port: Some("7001".into()),
            ..Default::default()
        };
        assert_eq!(normalize(&raw).port, Some(7001));
    }

    #[test]
    fn invalid_values_fall_back() {
        let raw = RawFlags {
            port: Some("http".into()),
            build_type: Some("desktop".into()),
            size: Some("pie".into()),
            ..Default::default()
        };
        let option = normalize(&raw);
        assert_eq!(option.port, None);
        assert_eq!(option.build_type, None);
        assert_eq!(option.size_analyzer, Some(SizeAnalyzer::Analyzer));
    }

    #[test]
    fn target_filters_are_independent() {
        let raw = RawFlags {
            only_dll: true,
            only_node: true,
            ..Default::default()
        };
        let option = normalize(&raw);
        assert!(option.only_dll && option.only_node && !option.only_web);
        assert!(option.has_target_filter());
    }

    #[test]
    fn install_mode_enables_check() {
        let raw = RawFlags {
            install_mode: Some("yarn".into()),
            ..Default::default()
        };
        assert_eq!(
            normalize(&raw).install_check,
            Some(InstallCheck {
                check: true,
                npm: "yarn".into()
            })
        );
    }
}
