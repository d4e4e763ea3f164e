// ABOUTME: Stage sequencer: groups plan stages into the named groups the executor runs.
// ABOUTME: Source, Build, Deploy as separate groups, or Source and a merged Buildeploy group.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};

use super::error::PlanError;
use super::stage::{Stage, StageKind, StagePlan};

/// Whether Build and Deploy run as separate stage groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageLayout {
    /// `Source`, `Build`, `Deploy`.
    #[default]
    Separate,
    /// `Source`, `Buildeploy`.
    Merged,
}

/// A named group of stages run as one unit by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageGroup {
    pub name: String,
    pub stages: NonEmpty<Stage>,
}

/// Group a plan's stages according to `layout`.
///
/// # Errors
///
/// Returns `PlanError::EmptyGroup` when a group would have no stages.
pub fn sequence(plan: &StagePlan, layout: StageLayout) -> Result<Vec<StageGroup>, PlanError> {
    let of_kind = |kinds: &[StageKind]| -> Vec<Stage> {
        plan.stages()
            .iter()
            .filter(|s| kinds.contains(&s.kind))
            .cloned()
            .collect()
    };

    let layout_groups: Vec<(&str, Vec<Stage>)> = match layout {
        StageLayout::Separate => vec![
            ("Source", of_kind(&[StageKind::Source])),
            ("Build", of_kind(&[StageKind::Build])),
            ("Deploy", of_kind(&[StageKind::Deploy])),
        ],
        StageLayout::Merged => vec![
            ("Source", of_kind(&[StageKind::Source])),
            ("Buildeploy", of_kind(&[StageKind::Build, StageKind::Deploy])),
        ],
    };

    layout_groups
        .into_iter()
        .map(|(name, stages)| {
            NonEmpty::from_vec(stages)
                .map(|stages| StageGroup {
                    name: name.to_string(),
                    stages,
                })
                .ok_or_else(|| PlanError::EmptyGroup(name.to_string()))
        })
        .collect()
}
