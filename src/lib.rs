//! # latent-translate
//!
//! Learn maps between embedding spaces produced by different encoders over the
//! same items.
//!
//! A [`LatentTranslator`] is a source transform chain, an estimator and a
//! target transform chain. It is fitted once on paired anchors and then
//! translates new source vectors into the target space:
//!
//! ```text
//! x ─► source transforms ─► estimator ─► target transforms (reversed) ─► y
//! ```
//!
//! Estimators range from the orthogonal Procrustes solution ([`EstimatorMethod::Svd`])
//! through least squares to an affine map trained by gradient descent.
//! Spaces are [`LatentSpace`]s keyed by sample id and can be persisted in a
//! [`SpaceStore`] under a hash of their metadata.
//!
//! ## Quick Start
//!
//! ```
//! use latent_translate::{LatentTranslator, TranslatorConfig};
//! use ndarray::array;
//!
//! let config = TranslatorConfig::from_json(
//!     r#"{"estimator": "svd", "source_transforms": ["centering"], "target_transforms": ["centering"]}"#,
//! ).unwrap();
//! let mut translator = LatentTranslator::from_config(&config);
//!
//! let source = array![[1.0, 0.0], [0.0, 1.0], [2.0, 1.0]];
//! let target = array![[0.0, 1.0], [-1.0, 0.0], [-1.0, 2.0]];
//! translator.fit(source.view(), target.view()).unwrap();
//!
//! let translated = translator.apply(source.view()).unwrap().target;
//! assert_eq!(translated.dim(), (3, 2));
//! ```

pub mod encode;
pub mod error;
pub mod estimators;
pub mod linalg;
pub mod loss;
pub mod model;
pub mod optimizer;
pub mod serialization;
pub mod space;
pub mod trainer;
pub mod transforms;
pub mod translate;

pub use error::{Result, TranslateError};
pub use estimators::{Estimate, Estimator, EstimatorMethod, FitInfo, InfoValue};
pub use serialization::SerializableParams;
pub use space::{LatentSpace, SpaceStore};
pub use transforms::{Transform, TransformKind, TransformStep};
pub use translate::{LatentTranslator, Translation, TranslatorConfig};
