//! Producing latent spaces from raw items.
//!
//! An [`Encoder`] turns a batch of items into vectors, possibly several named
//! ones (one per layer, say). [`Pooler`]s pick or reduce those into the
//! batches that become spaces. [`encode_feature`] drives both over a whole
//! feature in fixed-size batches.

use crate::error::{Result, TranslateError};
use crate::space::{LatentSpace, Metadata};
use ndarray::Array2;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Raw encoder output for one batch.
#[derive(Clone, Debug, PartialEq)]
pub enum EncoderOutput {
    Single(Array2<f64>),
    Named(BTreeMap<String, Array2<f64>>),
}

/// A model mapping items to vectors.
pub trait Encoder<Item> {
    /// Identifier recorded as `"model"` in space metadata.
    fn key(&self) -> &str;

    /// Encode one batch; every output has one row per item.
    fn encode(&mut self, items: &[Item]) -> Result<EncoderOutput>;
}

/// Reduces a raw encoding into one or more vector batches, each tagged with
/// the properties that distinguish it.
pub trait Pooler {
    fn pool(&self, output: &EncoderOutput) -> Result<Vec<(Array2<f64>, Metadata)>>;
}

/// Selects named outputs and tags each with `{"layer": name}`.
#[derive(Clone, Debug)]
pub struct LayerPooler {
    layers: Vec<String>,
}

impl LayerPooler {
    pub fn new<S: Into<String>>(layers: impl IntoIterator<Item = S>) -> Self {
        Self {
            layers: layers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }
}

impl Pooler for LayerPooler {
    fn pool(&self, output: &EncoderOutput) -> Result<Vec<(Array2<f64>, Metadata)>> {
        let named = match output {
            EncoderOutput::Named(named) => named,
            EncoderOutput::Single(_) => {
                return Err(TranslateError::InvalidParameter(
                    "LayerPooler needs named encoder outputs".to_string(),
                ))
            }
        };

        self.layers
            .iter()
            .map(|layer| {
                let vectors = named.get(layer).ok_or_else(|| {
                    TranslateError::InvalidParameter(format!("encoder produced no layer '{layer}'"))
                })?;
                let mut props = Metadata::new();
                props.insert("layer".to_string(), Value::String(layer.clone()));
                Ok((vectors.clone(), props))
            })
            .collect()
    }
}

/// Encode `items` batch by batch and collect one space per pooled output.
///
/// Without poolers the encoder must return [`EncoderOutput::Single`] and a
/// single space comes back. Each space's metadata is `base` with `"model"`
/// set to the encoder's key, extended by the pooler's properties.
pub fn encode_feature<I, E>(
    items: &[I],
    ids: &[String],
    encoder: &mut E,
    poolers: &[&dyn Pooler],
    batch_size: usize,
    base: &Metadata,
) -> Result<Vec<LatentSpace>>
where
    E: Encoder<I> + ?Sized,
{
    if batch_size == 0 {
        return Err(TranslateError::InvalidParameter(
            "batch_size must be positive".to_string(),
        ));
    }
    if items.len() != ids.len() {
        return Err(TranslateError::InvalidParameter(format!(
            "{} ids for {} items",
            ids.len(),
            items.len()
        )));
    }
    if items.is_empty() {
        return Err(TranslateError::EmptyData("no items to encode".to_string()));
    }

    let mut common = base.clone();
    common.insert("model".to_string(), Value::String(encoder.key().to_string()));

    info!(model = encoder.key(), items = items.len(), poolers = poolers.len(), "encoding feature");

    let mut spaces: Vec<LatentSpace> = Vec::new();
    for (batch_idx, (batch, batch_ids)) in items
        .chunks(batch_size)
        .zip(ids.chunks(batch_size))
        .enumerate()
    {
        let raw = encoder.encode(batch)?;
        let pooled = pool_batch(raw, poolers)?;

        if batch_idx == 0 {
            for (_, props) in &pooled {
                let mut metadata = common.clone();
                metadata.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
                spaces.push(LatentSpace::new(Array2::zeros((0, 0)), Vec::new())?.with_metadata(metadata));
            }
        } else if pooled.len() != spaces.len() {
            return Err(TranslateError::InvalidParameter(format!(
                "batch {batch_idx} pooled into {} outputs, expected {}",
                pooled.len(),
                spaces.len()
            )));
        }

        for (space, (vectors, _)) in spaces.iter_mut().zip(pooled) {
            space.extend(vectors.view(), batch_ids.to_vec())?;
        }
        debug!(batch = batch_idx, rows = batch.len(), "encoded batch");
    }

    Ok(spaces)
}

fn pool_batch(raw: EncoderOutput, poolers: &[&dyn Pooler]) -> Result<Vec<(Array2<f64>, Metadata)>> {
    if poolers.is_empty() {
        return match raw {
            EncoderOutput::Single(vectors) => Ok(vec![(vectors, Metadata::new())]),
            EncoderOutput::Named(_) => Err(TranslateError::InvalidParameter(
                "named encoder outputs need at least one pooler".to_string(),
            )),
        };
    }

    let mut pooled = Vec::new();
    for pooler in poolers {
        pooled.extend(pooler.pool(&raw)?);
    }
    Ok(pooled)
}
