//! Request-level types shared across mediadrop

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

/// Requested media quality
///
/// `highest` and `best` are synonyms; `mid` sits on the 720p bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Highest,
    #[default]
    Best,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    Mid,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
    Lowest,
}

impl Quality {
    /// Every accepted quality, in wire order
    pub const ALL: [Quality; 8] = [
        Quality::Highest,
        Quality::Best,
        Quality::P1080,
        Quality::P720,
        Quality::Mid,
        Quality::P480,
        Quality::P360,
        Quality::Lowest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Highest => "highest",
            Quality::Best => "best",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::Mid => "mid",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
            Quality::Lowest => "lowest",
        }
    }

    /// Height cap in pixels, `None` when the quality is unbounded or `lowest`
    pub fn max_height(self) -> Option<u32> {
        match self {
            Quality::Highest | Quality::Best | Quality::Lowest => None,
            Quality::P1080 => Some(1080),
            Quality::P720 | Quality::Mid => Some(720),
            Quality::P480 => Some(480),
            Quality::P360 => Some(360),
        }
    }

    fn allowed_list() -> String {
        Self::ALL.iter().map(|q| q.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl std::str::FromStr for Quality {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| CommonError::InvalidQuality {
                value: s.to_string(),
                allowed: Self::allowed_list(),
            })
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output container; mp4 is the only one produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mp4" => Ok(OutputFormat::Mp4),
            other => Err(CommonError::UnsupportedFormat {
                value: other.to_string(),
                expected: "mp4".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_from_str() {
        assert_eq!("1080p".parse::<Quality>().unwrap(), Quality::P1080);
        assert_eq!("mid".parse::<Quality>().unwrap(), Quality::Mid);
        assert_eq!("lowest".parse::<Quality>().unwrap(), Quality::Lowest);
        // Case matters on the wire
        assert!("720P".parse::<Quality>().is_err());
        assert!("4k".parse::<Quality>().is_err());
    }

    #[test]
    fn test_quality_error_lists_allowed_values() {
        let err = "ultra".parse::<Quality>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("highest, best, 1080p, 720p, mid, 480p, 360p, lowest"));
        assert!(message.contains("ultra"));
    }

    #[test]
    fn test_quality_serde_matches_display() {
        for quality in Quality::ALL {
            let json = serde_json::to_string(&quality).unwrap();
            assert_eq!(json, format!("\"{}\"", quality));
            let back: Quality = serde_json::from_str(&json).unwrap();
            assert_eq!(back, quality);
        }
    }

    #[test]
    fn test_max_height() {
        assert_eq!(Quality::Best.max_height(), None);
        assert_eq!(Quality::Mid.max_height(), Some(720));
        assert_eq!(Quality::P360.max_height(), Some(360));
    }

    #[test]
    fn test_output_format() {
        assert_eq!("mp4".parse::<OutputFormat>().unwrap(), OutputFormat::Mp4);
        assert!(matches!(
            "webm".parse::<OutputFormat>(),
            Err(CommonError::UnsupportedFormat { .. })
        ));
    }
}
