use crate::error::{Result, TranslateError};
use crate::estimators::{Estimate, Estimator, FitInfo};
use crate::space::{self, LatentSpace};
use crate::transforms::{Transform, TransformStep, ZeroPadding};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const NAME: &str = "LatentTranslator";

/// Output of [`LatentTranslator::apply`].
#[derive(Clone, Debug)]
pub struct Translation {
    /// Input after every source transform, i.e. what the estimator saw.
    pub source: Array2<f64>,
    /// Image of the input in the target space, in the target's native scale.
    pub target: Array2<f64>,
    /// Per-call diagnostics; currently always empty.
    pub info: FitInfo,
}

/// Data retained from the single call to `fit`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct FitRecord {
    source_data: Array2<f64>,
    target_data: Array2<f64>,
    transformed_source_data: Array2<f64>,
    transformed_target_data: Array2<f64>,
    info: FitInfo,
}

/// Maps vectors from a source latent space into a target latent space.
///
/// A translator owns a source transform chain, a target transform chain and
/// one estimator. `fit` fits them all on paired anchors; `apply` runs new
/// source vectors through the source chain forward, the estimator, and the
/// target chain in reverse, so results come back in the target's own scale.
///
/// When the two spaces differ in width the narrower side gets a trailing
/// [`ZeroPadding`] step during `fit` (with `autopad`, the default).
///
/// # Example
///
/// ```
/// use latent_translate::estimators::SvdEstimator;
/// use latent_translate::transforms::StandardScaling;
/// use latent_translate::translate::LatentTranslator;
/// use ndarray::array;
///
/// let source = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 0.5]];
/// let target = array![[0.0, 1.0], [-1.0, 0.0], [-1.0, 1.0], [-0.5, 2.0]];
///
/// let mut translator = LatentTranslator::new(0, SvdEstimator::new())
///     .with_source_transform(StandardScaling::new())
///     .with_target_transform(StandardScaling::new());
/// translator.fit(source.view(), target.view()).unwrap();
///
/// let out = translator.apply(source.view()).unwrap();
/// assert_eq!(out.target.dim(), (4, 2));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LatentTranslator {
    random_seed: u64,
    estimator: Estimator,
    source_transforms: Vec<TransformStep>,
    target_transforms: Vec<TransformStep>,
    autopad: bool,
    fitted: bool,
    record: Option<FitRecord>,
}

impl LatentTranslator {
    /// Create an unfitted translator with empty transform chains and `autopad` on.
    pub fn new(random_seed: u64, estimator: impl Into<Estimator>) -> Self {
        Self {
            random_seed,
            estimator: estimator.into(),
            source_transforms: Vec::new(),
            target_transforms: Vec::new(),
            autopad: true,
            fitted: false,
            record: None,
        }
    }

    /// Replace the source transform chain.
    pub fn with_source_transforms(mut self, transforms: Vec<TransformStep>) -> Self {
        self.source_transforms = transforms;
        self
    }

    /// Replace the target transform chain.
    pub fn with_target_transforms(mut self, transforms: Vec<TransformStep>) -> Self {
        self.target_transforms = transforms;
        self
    }

    /// Append one step to the source chain.
    pub fn with_source_transform(mut self, transform: impl Into<TransformStep>) -> Self {
        self.source_transforms.push(transform.into());
        self
    }

    /// Append one step to the target chain.
    pub fn with_target_transform(mut self, transform: impl Into<TransformStep>) -> Self {
        self.target_transforms.push(transform.into());
        self
    }

    /// Whether `fit` may pad the narrower space to reconcile widths.
    pub fn with_autopad(mut self, autopad: bool) -> Self {
        self.autopad = autopad;
        self
    }

    /// Fit transforms and the estimator on paired anchors.
    ///
    /// Row `i` of `source` and row `i` of `target` must describe the same item.
    /// Returns the estimator's diagnostics.
    ///
    /// The translator counts as fitted from the moment this is called, so a
    /// failed fit cannot be retried on the same instance.
    ///
    /// # Errors
    /// - [`TranslateError::AlreadyFitted`] on a second call
    /// - [`TranslateError::ShapeMismatch`] when the row counts differ
    /// - [`TranslateError::EmptyData`] when there are no anchors
    /// - [`TranslateError::DimensionMismatch`] when widths differ and `autopad`
    ///   is off, or the chains end at different widths
    pub fn fit(
        &mut self,
        source_data: ArrayView2<'_, f64>,
        target_data: ArrayView2<'_, f64>,
    ) -> Result<FitInfo> {
        if self.fitted {
            return Err(TranslateError::AlreadyFitted(NAME));
        }
        self.fitted = true;

        if source_data.nrows() != target_data.nrows() {
            return Err(TranslateError::ShapeMismatch {
                source_rows: source_data.nrows(),
                target_rows: target_data.nrows(),
            });
        }
        if source_data.nrows() == 0 {
            return Err(TranslateError::EmptyData(
                "cannot fit a translator on zero anchors".to_string(),
            ));
        }

        let (source_dim, target_dim) = (source_data.ncols(), target_data.ncols());
        if source_dim != target_dim {
            if !self.autopad {
                return Err(TranslateError::DimensionMismatch {
                    source_dim,
                    target_dim,
                });
            }
            let padding = ZeroPadding::new(source_dim.abs_diff(target_dim));
            if source_dim < target_dim {
                self.source_transforms.push(padding.into());
            } else {
                self.target_transforms.push(padding.into());
            }
        }

        let transformed_source_data = fit_chain(&mut self.source_transforms, source_data)?;
        let transformed_target_data = fit_chain(&mut self.target_transforms, target_data)?;
        if transformed_source_data.ncols() != transformed_target_data.ncols() {
            return Err(TranslateError::DimensionMismatch {
                source_dim: transformed_source_data.ncols(),
                target_dim: transformed_target_data.ncols(),
            });
        }

        let fit_info = self.estimator.fit(
            transformed_source_data.view(),
            transformed_target_data.view(),
            self.random_seed,
        )?;
        info!(
            estimator = %self.estimator.method(),
            anchors = source_data.nrows(),
            source_dim,
            target_dim,
            width = transformed_source_data.ncols(),
            "fitted latent translator"
        );

        self.record = Some(FitRecord {
            source_data: source_data.to_owned(),
            target_data: target_data.to_owned(),
            transformed_source_data,
            transformed_target_data,
            info: fit_info.clone(),
        });
        Ok(fit_info)
    }

    /// Fit on the anchors two spaces share, matched by id.
    ///
    /// Rows are paired by id in `source`'s order; ids present in only one
    /// space are ignored.
    pub fn fit_spaces(&mut self, source: &LatentSpace, target: &LatentSpace) -> Result<FitInfo> {
        let (source_data, target_data) = space::align(source, target);
        debug!(shared = source_data.nrows(), "aligned spaces by id");
        self.fit(source_data.view(), target_data.view())
    }

    /// Translate source-space rows into the target space.
    ///
    /// # Errors
    /// - [`TranslateError::NotFitted`] before a successful `fit`
    /// - [`TranslateError::FeatureMismatch`] when `x` is not as wide as the source anchors
    pub fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Translation> {
        if self.record.is_none() {
            return Err(TranslateError::NotFitted(NAME));
        }

        let mut source_x = x.to_owned();
        for transform in &self.source_transforms {
            source_x = transform.apply(source_x.view())?;
        }

        let mut target_x = self.estimator.apply(source_x.view())?;
        for transform in self.target_transforms.iter().rev() {
            target_x = transform.reverse(target_x.view())?;
        }

        Ok(Translation {
            source: source_x,
            target: target_x,
            info: FitInfo::new(),
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    pub fn autopad(&self) -> bool {
        self.autopad
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    /// Source chain, including any padding added by `fit`.
    pub fn source_transforms(&self) -> &[TransformStep] {
        &self.source_transforms
    }

    /// Target chain, including any padding added by `fit`.
    pub fn target_transforms(&self) -> &[TransformStep] {
        &self.target_transforms
    }

    /// Estimator diagnostics from a successful fit.
    pub fn fit_info(&self) -> Option<&FitInfo> {
        self.record.as_ref().map(|r| &r.info)
    }

    /// Raw source anchors passed to `fit`.
    pub fn source_data(&self) -> Option<&Array2<f64>> {
        self.record.as_ref().map(|r| &r.source_data)
    }

    /// Raw target anchors passed to `fit`.
    pub fn target_data(&self) -> Option<&Array2<f64>> {
        self.record.as_ref().map(|r| &r.target_data)
    }

    /// Source anchors after the full source chain.
    pub fn transformed_source_data(&self) -> Option<&Array2<f64>> {
        self.record.as_ref().map(|r| &r.transformed_source_data)
    }

    /// Target anchors after the full target chain.
    pub fn transformed_target_data(&self) -> Option<&Array2<f64>> {
        self.record.as_ref().map(|r| &r.transformed_target_data)
    }
}

/// Fit each step on the output of the previous one.
fn fit_chain(chain: &mut [TransformStep], data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let mut current = data.to_owned();
    for transform in chain.iter_mut() {
        current = transform.fit_apply(current.view())?;
    }
    Ok(current)
}
