use super::LatentTranslator;
use crate::error::Result;
use crate::estimators::{Estimator, EstimatorMethod, LinearEstimator, LinearEstimatorConfig};
use crate::transforms::{TransformKind, TransformStep};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Declarative description of a translator.
///
/// ```json
/// {
///   "random_seed": 0,
///   "estimator": "svd",
///   "source_transforms": ["centering", "std_scaling"],
///   "target_transforms": ["standard_scaling"]
/// }
/// ```
///
/// Omitted fields take their defaults: seed 0, `svd`, empty chains,
/// `autopad` on and the default [`LinearEstimatorConfig`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub random_seed: u64,
    pub estimator: EstimatorMethod,
    /// Used only when `estimator` is `linear`.
    pub linear: LinearEstimatorConfig,
    pub source_transforms: Vec<TransformKind>,
    pub target_transforms: Vec<TransformKind>,
    pub autopad: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            random_seed: 0,
            estimator: EstimatorMethod::Svd,
            linear: LinearEstimatorConfig::default(),
            source_transforms: Vec::new(),
            target_transforms: Vec::new(),
            autopad: true,
        }
    }
}

impl TranslatorConfig {
    pub fn new(random_seed: u64, estimator: EstimatorMethod) -> Self {
        Self {
            random_seed,
            estimator,
            ..Self::default()
        }
    }

    pub fn with_source_transforms(mut self, transforms: Vec<TransformKind>) -> Self {
        self.source_transforms = transforms;
        self
    }

    pub fn with_target_transforms(mut self, transforms: Vec<TransformKind>) -> Self {
        self.target_transforms = transforms;
        self
    }

    pub fn with_linear(mut self, linear: LinearEstimatorConfig) -> Self {
        self.linear = linear;
        self
    }

    pub fn with_autopad(mut self, autopad: bool) -> Self {
        self.autopad = autopad;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn build_estimator(&self) -> Estimator {
        match self.estimator {
            EstimatorMethod::Linear => LinearEstimator::with_config(self.linear.clone()).into(),
            method => method.build(),
        }
    }
}

impl LatentTranslator {
    /// Build an unfitted translator from its configuration.
    pub fn from_config(config: &TranslatorConfig) -> Self {
        let build = |kinds: &[TransformKind]| -> Vec<TransformStep> {
            kinds.iter().map(|k| k.build()).collect()
        };
        LatentTranslator::new(config.random_seed, config.build_estimator())
            .with_source_transforms(build(&config.source_transforms))
            .with_target_transforms(build(&config.target_transforms))
            .with_autopad(config.autopad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranslateError;
    use crate::estimators::Estimate;
    use crate::optimizer::OptimizerKind;
    use crate::transforms::Transform;

    #[test]
    fn test_config_from_json() {
        let config = TranslatorConfig::from_json(
            r#"{
                "random_seed": 5,
                "estimator": "lstsq+ortho",
                "source_transforms": ["centering", "std_scaling"],
                "target_transforms": ["l2"],
                "autopad": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.random_seed, 5);
        assert_eq!(config.estimator, EstimatorMethod::LstsqOrtho);
        assert_eq!(
            config.source_transforms,
            vec![TransformKind::Centering, TransformKind::StdScaling]
        );
        assert!(!config.autopad);
    }

    #[test]
    fn test_config_defaults() {
        let config = TranslatorConfig::from_json("{}").unwrap();
        assert_eq!(config, TranslatorConfig::default());
        assert!(config.autopad);
        assert_eq!(config.estimator, EstimatorMethod::Svd);
    }

    #[test]
    fn test_config_unknown_estimator() {
        let result = TranslatorConfig::from_json(r#"{"estimator": "qr"}"#);
        assert!(matches!(result, Err(TranslateError::Serialization(_))));
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = TranslatorConfig::new(1, EstimatorMethod::Linear)
            .with_source_transforms(vec![TransformKind::StandardScaling])
            .with_linear(LinearEstimatorConfig::default().with_optimizer(OptimizerKind::Sgd));
        let json = config.to_json().unwrap();
        assert_eq!(TranslatorConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_config_builds_chains() {
        let config = TranslatorConfig::new(9, EstimatorMethod::Linear)
            .with_source_transforms(vec![TransformKind::Centering, TransformKind::StdScaling])
            .with_target_transforms(vec![TransformKind::L2])
            .with_linear(LinearEstimatorConfig::default().with_steps(10));
        let translator = LatentTranslator::from_config(&config);

        assert_eq!(translator.random_seed(), 9);
        assert!(!translator.is_fitted());
        let names: Vec<_> = translator.source_transforms().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Centering", "StdScaling"]);
        assert_eq!(translator.target_transforms()[0].name(), "L2");
        match translator.estimator() {
            Estimator::Linear(e) => assert_eq!(e.config().steps, 10),
            other => panic!("unexpected estimator {}", other.name()),
        }
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translator.json");
        std::fs::write(&path, r#"{"estimator": "absolute"}"#).unwrap();
        let config = TranslatorConfig::from_json_file(&path).unwrap();
        assert_eq!(config.estimator, EstimatorMethod::Identity);
    }
}
