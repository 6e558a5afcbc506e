use std::path::Path;

use anyhow::{bail, Context, Result};
use dodger_core::{FrameSnapshot, HitEvent};
use serde::Deserialize;

/// A recorded sequence of frames to replay through the executor.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    pub frames: Vec<ScenarioFrame>,
}

/// One recorded frame. The snapshot stays current until the next frame.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFrame {
    /// Game time of the frame, in milliseconds
    pub t_ms: u64,
    #[serde(flatten)]
    pub snapshot: FrameSnapshot,
    /// Hit notifications delivered with this frame
    #[serde(default)]
    pub hits: Vec<HitEvent>,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        let scenario = Self::parse(&contents)
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(contents)?;
        if scenario.frames.is_empty() {
            bail!("Scenario has no frames");
        }
        if let Some(pair) = scenario
            .frames
            .windows(2)
            .find(|pair| pair[1].t_ms < pair[0].t_ms)
        {
            bail!(
                "Frames are out of order: {} ms comes after {} ms",
                pair[1].t_ms,
                pair[0].t_ms
            );
        }
        Ok(scenario)
    }

    /// Time of the last frame.
    pub fn end_ms(&self) -> u64 {
        self.frames.last().map(|frame| frame.t_ms).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use dodger_core::{EntityId, ProjectileKind};

    use super::*;

    const SCENARIO: &str = r#"{
        "name": "single missile",
        "frames": [
            {
                "t_ms": 0,
                "own": { "id": 1, "position": [0.0, 0.0], "heading": 0.0, "aircraft": "Predator" },
                "projectiles": [
                    { "id": 10, "kind": "PredatorMissile", "position": [200.0, 0.0], "owner": 2 }
                ]
            },
            { "t_ms": 900, "hits": [{ "target": 1, "projectile": 10 }] }
        ]
    }"#;

    #[test]
    fn parses_frames_and_hits() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("single missile"));
        assert_eq!(scenario.frames.len(), 2);
        assert_eq!(scenario.end_ms(), 900);

        let first = &scenario.frames[0].snapshot;
        assert_eq!(first.own.as_ref().map(|own| own.id), Some(EntityId::new(1)));
        assert_eq!(first.projectiles[0].kind, ProjectileKind::PredatorMissile);
        assert!(scenario.frames[1].snapshot.own.is_none());
        assert_eq!(scenario.frames[1].hits.len(), 1);
    }

    #[test]
    fn rejects_unordered_frames() {
        let err = Scenario::parse(r#"{ "frames": [{ "t_ms": 50 }, { "t_ms": 10 }] }"#).unwrap_err();
        assert!(err.to_string().contains("out of order"));
        assert!(Scenario::parse(r#"{ "frames": [] }"#).is_err());
    }

    #[test]
    fn load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        let err = Scenario::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid scenario"));
    }
}
