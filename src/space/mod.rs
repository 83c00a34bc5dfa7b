//! Latent spaces: vectors keyed by sample id, plus descriptive metadata.

pub mod store;

pub use store::{metadata_hash, SpaceStore};

use crate::error::{Result, TranslateError};
use ndarray::{Array2, ArrayBase, ArrayView2, Axis, Data, Ix2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Free-form description of a space (model, feature, split, pooling, ...).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A batch of vectors where row `i` belongs to sample `ids[i]`.
///
/// Ids are unique within a space. Two spaces built over the same items can be
/// paired row by row with [`align`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatentSpace {
    vectors: Array2<f64>,
    ids: Vec<String>,
    metadata: Metadata,
}

impl LatentSpace {
    /// # Errors
    /// [`TranslateError::InvalidParameter`] if the id count differs from the
    /// row count or an id repeats.
    pub fn new(vectors: Array2<f64>, ids: Vec<String>) -> Result<Self> {
        check_ids(&vectors, &ids, &HashSet::new())?;
        Ok(Self {
            vectors,
            ids,
            metadata: Metadata::new(),
        })
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Append another batch of rows, keeping ids unique.
    pub fn extend(&mut self, vectors: ArrayView2<'_, f64>, ids: Vec<String>) -> Result<()> {
        if !self.is_empty() && vectors.ncols() != self.dim() {
            return Err(TranslateError::FeatureMismatch {
                expected_features: self.dim(),
                got_features: vectors.ncols(),
            });
        }
        let existing: HashSet<&str> = self.ids.iter().map(String::as_str).collect();
        check_ids(&vectors, &ids, &existing)?;

        if self.is_empty() {
            self.vectors = vectors.to_owned();
        } else {
            self.vectors
                .append(Axis(0), vectors)
                .map_err(|e| TranslateError::InvalidParameter(e.to_string()))?;
        }
        self.ids.extend(ids);
        Ok(())
    }

    pub fn vectors(&self) -> &Array2<f64> {
        &self.vectors
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    /// Content hash of the metadata; names the space on disk.
    pub fn hash(&self) -> Result<String> {
        metadata_hash(&self.metadata)
    }
}

fn check_ids<S>(vectors: &ArrayBase<S, Ix2>, ids: &[String], existing: &HashSet<&str>) -> Result<()>
where
    S: Data<Elem = f64>,
{
    if ids.len() != vectors.nrows() {
        return Err(TranslateError::InvalidParameter(format!(
            "{} ids for {} vectors",
            ids.len(),
            vectors.nrows()
        )));
    }
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if existing.contains(id.as_str()) || !seen.insert(id.as_str()) {
            return Err(TranslateError::InvalidParameter(format!("duplicate id '{id}'")));
        }
    }
    Ok(())
}

/// Rows of `a` and `b` for the ids both spaces contain, in `a`'s order.
pub fn align(a: &LatentSpace, b: &LatentSpace) -> (Array2<f64>, Array2<f64>) {
    let b_index: HashMap<&str, usize> = b
        .ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let (a_rows, b_rows): (Vec<usize>, Vec<usize>) = a
        .ids
        .iter()
        .enumerate()
        .filter_map(|(i, id)| b_index.get(id.as_str()).map(|&j| (i, j)))
        .unzip();

    (
        a.vectors.select(Axis(0), &a_rows),
        b.vectors.select(Axis(0), &b_rows),
    )
}
