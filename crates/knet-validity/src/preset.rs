//! Transform preset selection.
//!
//! Picks a compression preset for a fragment from its type and the current
//! context pressure. Nothing here transforms text: the selected preset's
//! instructions are handed to the host model.
//!
//! | pressure      | preset                                   |
//! |---------------|------------------------------------------|
//! | `> 0.7`       | `max_compression` for every type         |
//! | `< 0.3`       | the type's quality preset, else balanced |
//! | otherwise     | the type's default preset, else balanced |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidityError};

/// Pressure strictly above this selects maximum compression.
pub const HIGH_PRESSURE: f64 = 0.7;

/// Pressure strictly below this selects the quality preset.
pub const LOW_PRESSURE: f64 = 0.3;

/// Preset used when a type has no mapping for the current band.
pub const FALLBACK_PRESET: PresetKey = PresetKey::Balanced;

/// Kind of knowledge a fragment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FragmentType {
    Fact,
    Definition,
    Procedure,
    Observation,
    Example,
    Hypothesis,
    Synthesis,
    Insight,
    Question,
    Note,
}

impl FragmentType {
    pub const ALL: [FragmentType; 10] = [
        FragmentType::Fact,
        FragmentType::Definition,
        FragmentType::Procedure,
        FragmentType::Observation,
        FragmentType::Example,
        FragmentType::Hypothesis,
        FragmentType::Synthesis,
        FragmentType::Insight,
        FragmentType::Question,
        FragmentType::Note,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            FragmentType::Fact => "FACT",
            FragmentType::Definition => "DEFINITION",
            FragmentType::Procedure => "PROCEDURE",
            FragmentType::Observation => "OBSERVATION",
            FragmentType::Example => "EXAMPLE",
            FragmentType::Hypothesis => "HYPOTHESIS",
            FragmentType::Synthesis => "SYNTHESIS",
            FragmentType::Insight => "INSIGHT",
            FragmentType::Question => "QUESTION",
            FragmentType::Note => "NOTE",
        }
    }

    /// Reasoning products whose structure normally outweighs brevity.
    pub const fn is_reasoning(self) -> bool {
        matches!(
            self,
            FragmentType::Hypothesis | FragmentType::Synthesis | FragmentType::Insight
        )
    }

    /// Preset under moderate pressure.
    pub const fn default_preset(self) -> Option<PresetKey> {
        match self {
            FragmentType::Fact | FragmentType::Observation => Some(PresetKey::Aggressive),
            FragmentType::Definition | FragmentType::Example => Some(PresetKey::Balanced),
            FragmentType::Procedure
            | FragmentType::Hypothesis
            | FragmentType::Synthesis
            | FragmentType::Insight => Some(PresetKey::StructurePreserving),
            FragmentType::Question | FragmentType::Note => None,
        }
    }

    /// Preset when there is plenty of room.
    pub const fn quality_preset(self) -> Option<PresetKey> {
        match self {
            FragmentType::Fact | FragmentType::Observation => Some(PresetKey::Balanced),
            FragmentType::Example => Some(PresetKey::StructurePreserving),
            FragmentType::Definition
            | FragmentType::Procedure
            | FragmentType::Hypothesis
            | FragmentType::Synthesis
            | FragmentType::Insight => Some(PresetKey::Lossless),
            FragmentType::Question | FragmentType::Note => None,
        }
    }
}

impl fmt::Display for FragmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FragmentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FragmentType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown fragment type {s:?}"))
    }
}

/// Named compression presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetKey {
    MaxCompression,
    Aggressive,
    Balanced,
    StructurePreserving,
    Lossless,
}

impl PresetKey {
    pub const ALL: [PresetKey; 5] = [
        PresetKey::MaxCompression,
        PresetKey::Aggressive,
        PresetKey::Balanced,
        PresetKey::StructurePreserving,
        PresetKey::Lossless,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PresetKey::MaxCompression => "max_compression",
            PresetKey::Aggressive => "aggressive",
            PresetKey::Balanced => "balanced",
            PresetKey::StructurePreserving => "structure_preserving",
            PresetKey::Lossless => "lossless",
        }
    }

    /// Static metadata for this preset.
    pub fn preset(self) -> &'static Preset {
        match self {
            PresetKey::MaxCompression => &MAX_COMPRESSION,
            PresetKey::Aggressive => &AGGRESSIVE,
            PresetKey::Balanced => &BALANCED,
            PresetKey::StructurePreserving => &STRUCTURE_PRESERVING,
            PresetKey::Lossless => &LOSSLESS,
        }
    }
}

impl fmt::Display for PresetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a preset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub key: PresetKey,
    /// Expected output length as a fraction of the input.
    pub compression_ratio: f64,
    /// Expected fidelity, 0 (lossy) to 5 (lossless).
    pub quality: u8,
    pub encode: &'static str,
    pub decode: &'static str,
}

static MAX_COMPRESSION: Preset = Preset {
    key: PresetKey::MaxCompression,
    compression_ratio: 0.15,
    quality: 2,
    encode: "Compress the text below to its bare claims. Drop examples, hedges and \
             connective prose. Use terse notation and abbreviations where unambiguous.",
    decode: "Expand the compressed notes below into plain sentences. Do not add claims \
             that are not present in the notes.",
};

static AGGRESSIVE: Preset = Preset {
    key: PresetKey::Aggressive,
    compression_ratio: 0.3,
    quality: 3,
    encode: "Summarize the text below in as few sentences as possible while keeping \
             every distinct claim, number and named entity.",
    decode: "Rewrite the summary below as readable prose, keeping every claim, number \
             and named entity exactly as given.",
};

static BALANCED: Preset = Preset {
    key: PresetKey::Balanced,
    compression_ratio: 0.5,
    quality: 4,
    encode: "Condense the text below to about half its length. Keep the key claims, \
             their qualifications and the most informative example.",
    decode: "Restore the condensed text below to a fuller explanation, preserving its \
             claims and qualifications without inventing detail.",
};

static STRUCTURE_PRESERVING: Preset = Preset {
    key: PresetKey::StructurePreserving,
    compression_ratio: 0.6,
    quality: 4,
    encode: "Shorten the text below while keeping its logical structure intact: \
             premises, steps and conclusions must stay in order and remain explicit.",
    decode: "Expand the text below, keeping its premises, steps and conclusions in the \
             same order.",
};

static LOSSLESS: Preset = Preset {
    key: PresetKey::Lossless,
    compression_ratio: 1.0,
    quality: 5,
    encode: "Normalize the whitespace and formatting of the text below without removing \
             or rephrasing any content.",
    decode: "Return the text below unchanged apart from restoring normal formatting.",
};

/// Pressure band a selection fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureBand {
    Low,
    Moderate,
    High,
}

impl PressureBand {
    pub fn of(pressure: f64) -> Self {
        if pressure > HIGH_PRESSURE {
            PressureBand::High
        } else if pressure < LOW_PRESSURE {
            PressureBand::Low
        } else {
            PressureBand::Moderate
        }
    }
}

/// Result of [`select_preset`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetSelection {
    pub fragment_type: FragmentType,
    pub pressure: f64,
    pub band: PressureBand,
    pub preset: PresetKey,
    /// The type had no mapping for this band.
    pub fallback: bool,
}

/// Choose a preset for `fragment_type` under `pressure` in [0, 1].
pub fn select_preset(fragment_type: FragmentType, pressure: f64) -> Result<PresetSelection> {
    if !(0.0..=1.0).contains(&pressure) {
        return Err(ValidityError::PressureOutOfRange(pressure));
    }

    let band = PressureBand::of(pressure);
    let mapped = match band {
        PressureBand::High => Some(PresetKey::MaxCompression),
        PressureBand::Low => fragment_type.quality_preset(),
        PressureBand::Moderate => fragment_type.default_preset(),
    };
    if band == PressureBand::High && fragment_type.is_reasoning() {
        tracing::debug!(%fragment_type, pressure, "reasoning fragment upgraded to max compression");
    }

    Ok(PresetSelection {
        fragment_type,
        pressure,
        band,
        preset: mapped.unwrap_or(FALLBACK_PRESET),
        fallback: mapped.is_none(),
    })
}

/// Instruction for the host model to compress `content` with `preset`.
pub fn encode_instructions(preset: PresetKey, content: &str) -> String {
    let meta = preset.preset();
    format!(
        "{}\nTarget length: about {}% of the original.\n\n---\n{}",
        meta.encode,
        percent(meta.compression_ratio),
        content
    )
}

/// Instruction for the host model to expand text compressed with `preset`.
pub fn decode_instructions(preset: PresetKey, compressed: &str) -> String {
    let meta = preset.preset();
    format!("{}\n\n---\n{}", meta.decode, compressed)
}

fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_pressure_boundary() {
        let at = select_preset(FragmentType::Fact, 0.7).unwrap();
        assert_eq!(at.band, PressureBand::Moderate);
        assert_eq!(at.preset, PresetKey::Aggressive);

        let above = select_preset(FragmentType::Fact, 0.71).unwrap();
        assert_eq!(above.band, PressureBand::High);
        assert_eq!(above.preset, PresetKey::MaxCompression);
    }

    #[test]
    fn test_low_pressure_boundary() {
        let at = select_preset(FragmentType::Definition, 0.3).unwrap();
        assert_eq!(at.preset, PresetKey::Balanced);
        let below = select_preset(FragmentType::Definition, 0.29).unwrap();
        assert_eq!(below.preset, PresetKey::Lossless);
    }

    #[test]
    fn test_high_pressure_overrides_every_type() {
        for t in FragmentType::ALL {
            let selection = select_preset(t, 0.95).unwrap();
            assert_eq!(selection.preset, PresetKey::MaxCompression, "{t}");
            assert!(!selection.fallback);
        }
    }

    #[test]
    fn test_reasoning_types_upgraded() {
        for t in [FragmentType::Hypothesis, FragmentType::Synthesis, FragmentType::Insight] {
            assert_eq!(select_preset(t, 0.5).unwrap().preset, PresetKey::StructurePreserving);
            assert_eq!(select_preset(t, 0.8).unwrap().preset, PresetKey::MaxCompression);
        }
    }

    #[test]
    fn test_unmapped_type_falls_back() {
        for pressure in [0.0, 0.5] {
            let selection = select_preset(FragmentType::Question, pressure).unwrap();
            assert_eq!(selection.preset, FALLBACK_PRESET);
            assert!(selection.fallback);
        }
    }

    #[test]
    fn test_pressure_out_of_range() {
        assert!(select_preset(FragmentType::Fact, -0.1).is_err());
        assert!(select_preset(FragmentType::Fact, 1.1).is_err());
        assert!(select_preset(FragmentType::Fact, f64::NAN).is_err());
    }

    #[test]
    fn test_metadata_is_consistent() {
        for key in PresetKey::ALL {
            let preset = key.preset();
            assert_eq!(preset.key, key);
            assert!(preset.quality <= 5);
            assert!(preset.compression_ratio > 0.0 && preset.compression_ratio <= 1.0);
        }
    }

    #[test]
    fn test_instructions_embed_content() {
        let encoded = encode_instructions(PresetKey::Balanced, "Mitochondria make ATP.");
        assert!(encoded.starts_with(BALANCED.encode));
        assert!(encoded.contains("about 50%"));
        assert!(encoded.ends_with("---\nMitochondria make ATP."));

        let decoded = decode_instructions(PresetKey::MaxCompression, "mito→ATP");
        assert!(decoded.ends_with("mito→ATP"));
    }

    #[test]
    fn test_fragment_type_parse() {
        assert_eq!("insight".parse::<FragmentType>().unwrap(), FragmentType::Insight);
        assert!("poem".parse::<FragmentType>().is_err());
    }
}
