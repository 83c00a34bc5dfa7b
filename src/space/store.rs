//! Directory-backed persistence for latent spaces.
//!
//! Every space lives under `<root>/<hash>/`, where `hash` is derived from its
//! metadata alone:
//!
//! ```text
//! <root>/
//!   6335ca45e5/
//!     metadata.json   4-space indent, sorted keys, ASCII-escaped
//!     vectors.bin     bincode {ids, vectors}
//! ```
//!
//! The hash is the first 10 hex digits of SHA-256 over the metadata rendered
//! the way Python's `json.dumps(metadata, sort_keys=True)` renders it, so
//! stores written by other tooling resolve to the same directories.

use super::{LatentSpace, Metadata};
use crate::error::{Result, TranslateError};
use crate::serialization::SerializableParams;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HASH_LEN: usize = 10;
const METADATA_FILE: &str = "metadata.json";
const VECTORS_FILE: &str = "vectors.bin";

/// Hash naming the directory a space with this metadata is stored in.
pub fn metadata_hash(metadata: &Metadata) -> Result<String> {
    let mut canonical = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut canonical, PythonFormatter);
    metadata.serialize(&mut ser)?;

    let digest = Sha256::digest(&canonical);
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    Ok(hash)
}

/// Compact JSON with `", "` / `": "` separators, ASCII-only strings and
/// `repr`-style floats.
struct PythonFormatter;

impl Formatter for PythonFormatter {
    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        write_ascii_fragment(writer, fragment)
    }

    fn write_f64<W: ?Sized + Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(float_repr(value).as_bytes())
    }
}

/// Indented JSON as written by `json.dump(indent=4)`: `PrettyFormatter`
/// layout with the same string and float rendering as [`PythonFormatter`].
struct PythonPrettyFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for PythonPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        write_ascii_fragment(writer, fragment)
    }

    fn write_f64<W: ?Sized + Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(float_repr(value).as_bytes())
    }
}

/// Printable ASCII as is; everything else as `\uXXXX` UTF-16 escapes.
fn write_ascii_fragment<W: ?Sized + Write>(writer: &mut W, fragment: &str) -> io::Result<()> {
    for c in fragment.chars() {
        if (' '..='~').contains(&c) {
            let mut buf = [0u8; 1];
            writer.write_all(c.encode_utf8(&mut buf).as_bytes())?;
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
        }
    }
    Ok(())
}

/// Shortest round-trip digits; fixed notation for exponents in `-4..16`,
/// otherwise `d.ddde+XX`.
fn float_repr(value: f64) -> String {
    let sci = format!("{value:e}");
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };

    if (-4..16).contains(&exponent) {
        let fixed = format!("{value}");
        if fixed.contains('.') {
            fixed
        } else {
            format!("{fixed}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

#[derive(Serialize)]
struct VectorsRef<'a> {
    ids: &'a [String],
    vectors: &'a Array2<f64>,
}

#[derive(Deserialize, Serialize)]
struct StoredVectors {
    ids: Vec<String>,
    vectors: Array2<f64>,
}

/// A directory of spaces addressed by metadata hash.
#[derive(Clone, Debug)]
pub struct SpaceStore {
    root: PathBuf,
}

impl SpaceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, hash: &str) -> PathBuf {
        self.root.join(hash)
    }

    /// Write `space` under its metadata hash, replacing any previous entry.
    pub fn save(&self, space: &LatentSpace) -> Result<String> {
        let hash = space.hash()?;
        let dir = self.dir(&hash);
        fs::create_dir_all(&dir)?;

        let mut json = Vec::new();
        let formatter = PythonPrettyFormatter(PrettyFormatter::with_indent(b"    "));
        let mut ser = serde_json::Serializer::with_formatter(&mut json, formatter);
        space.metadata().serialize(&mut ser)?;
        fs::write(dir.join(METADATA_FILE), json)?;

        let mut writer = BufWriter::new(fs::File::create(dir.join(VECTORS_FILE))?);
        let stored = VectorsRef {
            ids: space.ids(),
            vectors: space.vectors(),
        };
        bincode::serialize_into(&mut writer, &stored)?;
        writer.flush()?;

        info!(hash = %hash, rows = space.len(), dim = space.dim(), "saved latent space");
        Ok(hash)
    }

    fn load_metadata(&self, hash: &str) -> Result<Metadata> {
        let path = self.dir(hash).join(METADATA_FILE);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TranslateError::NotFound(format!("latent space '{hash}'")),
            _ => e.into(),
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn load(&self, hash: &str) -> Result<LatentSpace> {
        let metadata = self.load_metadata(hash)?;
        let stored = StoredVectors::load_from_file(self.dir(hash).join(VECTORS_FILE))?;
        debug!(hash, rows = stored.ids.len(), "loaded latent space");
        Ok(LatentSpace::new(stored.vectors, stored.ids)?.with_metadata(metadata))
    }

    /// Hashes of every stored space, sorted.
    pub fn hashes(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut hashes = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().join(METADATA_FILE).is_file() {
                hashes.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        hashes.sort();
        Ok(hashes)
    }

    /// Every stored space whose metadata contains all pairs in `filter`.
    pub fn find(&self, filter: &Metadata) -> Result<Vec<LatentSpace>> {
        let mut found = Vec::new();
        for hash in self.hashes()? {
            let metadata = self.load_metadata(&hash)?;
            let matches = filter
                .iter()
                .all(|(key, value)| metadata.get(key) == Some(value));
            if matches {
                found.push(self.load(&hash)?);
            }
        }
        debug!(matches = found.len(), "searched latent spaces");
        Ok(found)
    }

    pub fn remove(&self, hash: &str) -> Result<()> {
        let dir = self.dir(hash);
        if !dir.is_dir() {
            return Err(TranslateError::NotFound(format!("latent space '{hash}'")));
        }
        fs::remove_dir_all(dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    fn metadata(value: serde_json::Value) -> Metadata {
        serde_json::from_value(value).unwrap()
    }

    fn space(meta: serde_json::Value) -> LatentSpace {
        LatentSpace::new(
            array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            vec!["a".to_string(), "b".to_string()],
        )
        .unwrap()
        .with_metadata(metadata(meta))
    }

    #[test]
    fn test_hash_matches_python_json() {
        let meta = metadata(json!({
            "model": "bert-base-cased",
            "feature": "text",
            "split": "train",
            "dataset": "trec"
        }));
        assert_eq!(metadata_hash(&meta).unwrap(), "6335ca45e5");
    }

    #[test]
    fn test_hash_nested_values() {
        let meta = metadata(json!({"b": [1, 2.5], "a": {"y": null, "x": true}}));
        assert_eq!(metadata_hash(&meta).unwrap(), "23bd44e505");
    }

    #[test]
    fn test_hash_escapes_non_ascii() {
        let meta = metadata(json!({"name": "café"}));
        assert_eq!(metadata_hash(&meta).unwrap(), "fc762637e5");
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(2.5), "2.5");
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1.5e-7), "1.5e-07");
        assert_eq!(float_repr(-0.0), "-0.0");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpaceStore::new(dir.path());
        let original = space(json!({"model": "m1", "layer": 3}));

        let hash = store.save(&original).unwrap();
        assert_eq!(hash.len(), 10);
        assert!(dir.path().join(&hash).join("metadata.json").is_file());
        assert!(dir.path().join(&hash).join("vectors.bin").is_file());

        let restored = store.load(&hash).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_metadata_file_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpaceStore::new(dir.path());
        let hash = store.save(&space(json!({"b": 1, "a": 2}))).unwrap();

        let text = fs::read_to_string(dir.path().join(hash).join("metadata.json")).unwrap();
        assert_eq!(text, "{\n    \"a\": 2,\n    \"b\": 1\n}");
    }

    #[test]
    fn test_metadata_file_escapes_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpaceStore::new(dir.path());
        let original = space(json!({"name": "café", "scale": 1e20}));
        let hash = store.save(&original).unwrap();

        let text = fs::read_to_string(dir.path().join(&hash).join("metadata.json")).unwrap();
        assert_eq!(text, "{\n    \"name\": \"caf\\u00e9\",\n    \"scale\": 1e+20\n}");
        assert_eq!(store.load(&hash).unwrap(), original);
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpaceStore::new(dir.path());
        assert!(matches!(store.load("0000000000"), Err(TranslateError::NotFound(_))));
        assert!(matches!(store.remove("0000000000"), Err(TranslateError::NotFound(_))));
    }

    #[test]
    fn test_find_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpaceStore::new(dir.path().join("spaces"));
        assert!(store.hashes().unwrap().is_empty());

        let h1 = store.save(&space(json!({"model": "m1", "split": "train"}))).unwrap();
        let h2 = store.save(&space(json!({"model": "m2", "split": "train"}))).unwrap();
        store.save(&space(json!({"model": "m1", "split": "test"}))).unwrap();

        let mut expected = vec![h1.clone(), h2];
        let all = store.hashes().unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0] <= w[1]));

        let train = store.find(&metadata(json!({"split": "train"}))).unwrap();
        let mut train_hashes: Vec<_> = train.iter().map(|s| s.hash().unwrap()).collect();
        train_hashes.sort();
        expected.sort();
        assert_eq!(train_hashes, expected);

        let m1_train = store
            .find(&metadata(json!({"model": "m1", "split": "train"})))
            .unwrap();
        assert_eq!(m1_train.len(), 1);
        assert_eq!(m1_train[0].hash().unwrap(), h1);

        store.remove(&h1).unwrap();
        assert_eq!(store.hashes().unwrap().len(), 2);
    }
}
