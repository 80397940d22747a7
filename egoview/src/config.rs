use std::{fs, path::Path};

use anyhow::Context;
use egoview_core::LogSink;
use egoview_vision::SceneAbstractorCfg;
use serde::{Deserialize, Serialize};

use crate::{evaluation::EvaluatorCfg, question_router::QuestionRouterCfg};

/// All tunables of the pipeline. Every section and field may be omitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub scene_abstractor: SceneAbstractorCfg,
    pub question_router: QuestionRouterCfg,
    pub evaluation: EvaluatorCfg,
}

/// Reads a JSON [`PipelineConfig`]; a missing file gives the defaults.
pub fn load_config(path: &Path, log: &LogSink) -> anyhow::Result<PipelineConfig> {
    if !path.exists() {
        log.info(format_args!("no config at {}, using defaults", path.display()));
        return Ok(PipelineConfig::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    log.debug(format_args!("config {}: {config:?}", path.display()));
    Ok(config)
}

#[cfg(test)]
mod tests {
    use egoview_core::scene::LabelMatching;
    use egoview_vision::{EmptyMaskPolicy, PositionMode};

    use super::*;
    use crate::PerspectiveType;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{
                "scene_abstractor": { "empty_mask_policy": "abort", "fallback_focal_length_px": 500.0 },
                "question_router": { "label_matching": "case_insensitive", "decimals": 3 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.scene_abstractor.empty_mask_policy, EmptyMaskPolicy::Abort);
        assert_eq!(cfg.scene_abstractor.position_mode, PositionMode::ImagePlane);
        assert_eq!(cfg.scene_abstractor.fallback_focal_length_px, Some(500.0));
        assert_eq!(cfg.question_router.label_matching, LabelMatching::CaseInsensitive);
        assert_eq!(cfg.question_router.decimals, 3);
        assert_eq!(cfg.question_router.perspective_type, PerspectiveType::Numerical);
        assert!(cfg.evaluation.lowercase_prompts);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = load_config(Path::new("/nonexistent/egoview.json"), &LogSink::default()).unwrap();
        assert_eq!(cfg.question_router.decimals, 2);
        assert!(!cfg.question_router.attach_image_to_answer);
    }

    #[test]
    fn unknown_variant_is_rejected() {
        assert!(serde_json::from_str::<PipelineConfig>(
            r#"{ "question_router": { "perspective_type": "holographic" } }"#
        )
        .is_err());
    }
}
