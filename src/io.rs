//! Safetensors I/O for recordings and pipeline results.
//!
//! Reader: a recording container with
//!
//! | key             | dtype        | shape    |                                   |
//! |-----------------|--------------|----------|-----------------------------------|
//! | `data`          | F32 / F64    | `[C, T]` | required                          |
//! | `sfreq`         | F32 / F64    | `[1]`    | required                          |
//! | `ch_names`      | U8           | `[n]`    | newline-separated, optional       |
//! | `event_samples` | I32 / I64    | `[N]`    | optional                          |
//! | `event_labels`  | U8           | `[n]`    | newline-separated, with samples   |
//! | `ica_mixing`    | F32 / F64    | `[C, K]` | optional                          |
//! | `ica_unmixing`  | F32 / F64    | `[K, C]` | with `ica_mixing`                 |
//! | `ica_mean`      | F32 / F64    | `[C]`    | optional, zeros if absent         |
//!
//! Without `event_samples`, events are built from a JSON list of
//! [`Annotation`]s stored under `__metadata__["annotations"]`.
//!
//! Writer: [`StWriter`], a minimal safetensors builder.
use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::{Array, Array1, Array2, Dimension};

use crate::events::{events_from_annotations, Annotation, Event};
use crate::ica::IcaModel;
use crate::signal::ContinuousSignal;

// ── Low-level safetensors parser (raw bytes → ndarray, no tensor crate) ─────

struct StFile {
    bytes: Vec<u8>,
    header: HashMap<String, serde_json::Value>,
    data_start: usize,
}

impl StFile {
    fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        if bytes.len() < 8 {
            bail!("safetensors file too small: {}", path.display());
        }
        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[..8]);
        let n = u64::from_le_bytes(len) as usize;
        let header_bytes = bytes.get(8..8 + n).context("truncated safetensors header")?;
        let header: HashMap<String, serde_json::Value> =
            serde_json::from_slice(header_bytes).context("failed to parse safetensors header")?;
        Ok(Self { bytes, header, data_start: 8 + n })
    }

    fn has(&self, key: &str) -> bool {
        self.header.contains_key(key)
    }

    fn entry(&self, key: &str) -> Result<(&str, Vec<usize>, &[u8])> {
        let entry = self.header.get(key).with_context(|| format!("missing '{key}' tensor"))?;
        let dtype = entry["dtype"].as_str().with_context(|| format!("'{key}': no dtype"))?;
        let shape = entry["shape"]
            .as_array()
            .with_context(|| format!("'{key}': no shape"))?
            .iter()
            .map(|v| v.as_u64().map(|d| d as usize))
            .collect::<Option<Vec<_>>>()
            .with_context(|| format!("'{key}': bad shape"))?;
        let offsets = entry["data_offsets"]
            .as_array()
            .with_context(|| format!("'{key}': no data_offsets"))?;
        let (s, e) = match (offsets.first().and_then(|v| v.as_u64()), offsets.get(1).and_then(|v| v.as_u64())) {
            (Some(s), Some(e)) => (s as usize, e as usize),
            _ => bail!("'{key}': bad data_offsets"),
        };
        let raw = self
            .bytes
            .get(self.data_start + s..self.data_start + e)
            .with_context(|| format!("'{key}': data out of range"))?;
        Ok((dtype, shape, raw))
    }

    /// Any numeric tensor, converted to f64.
    fn f64_tensor(&self, key: &str) -> Result<(Vec<f64>, Vec<usize>)> {
        let (dtype, shape, raw) = self.entry(key)?;
        let vals: Vec<f64> = match dtype {
            "F32" => raw.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64).collect(),
            "F64" => raw
                .chunks_exact(8)
                .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
            "I32" => raw.chunks_exact(4).map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64).collect(),
            "I64" => raw
                .chunks_exact(8)
                .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64)
                .collect(),
            other => bail!("'{key}': unsupported dtype {other}"),
        };
        Ok((vals, shape))
    }

    fn array2(&self, key: &str) -> Result<Array2<f64>> {
        let (vals, shape) = self.f64_tensor(key)?;
        let &[r, c] = shape.as_slice() else {
            bail!("'{key}': expected 2-D tensor, got shape {shape:?}");
        };
        Ok(Array2::from_shape_vec((r, c), vals)?)
    }

    fn strings(&self, key: &str) -> Result<Vec<String>> {
        let (_, _, raw) = self.entry(key)?;
        let text = std::str::from_utf8(raw).with_context(|| format!("'{key}': not UTF-8"))?;
        Ok(text.split('\n').filter(|s| !s.is_empty()).map(String::from).collect())
    }

    fn metadata(&self, key: &str) -> Option<&str> {
        self.header.get("__metadata__")?.get(key)?.as_str()
    }
}

// ── Public structs ───────────────────────────────────────────────────────────

/// A recording loaded from disk.
pub struct Recording {
    pub signal: ContinuousSignal,
    /// Sorted by sample.
    pub events: Vec<Event>,
    pub ica: Option<IcaModel>,
}

impl Recording {
    pub fn load(path: &Path) -> Result<Self> {
        let st = StFile::open(path)?;

        let data = st.array2("data")?;
        let (sfreq, _) = st.f64_tensor("sfreq")?;
        let sfreq = *sfreq.first().context("'sfreq' is empty")?;
        let signal = if st.has("ch_names") {
            ContinuousSignal::new(data, sfreq, st.strings("ch_names")?)?
        } else {
            ContinuousSignal::with_default_names(data, sfreq)?
        };

        let events = if st.has("event_samples") {
            let (samples, _) = st.f64_tensor("event_samples")?;
            let labels = st.strings("event_labels")?;
            if labels.len() != samples.len() {
                bail!("{} event samples but {} labels", samples.len(), labels.len());
            }
            let mut events: Vec<Event> = samples
                .into_iter()
                .zip(labels)
                .map(|(s, l)| {
                    if s < 0.0 {
                        bail!("negative event sample {s}");
                    }
                    Ok(Event::new(s as usize, l))
                })
                .collect::<Result<_>>()?;
            events.sort_by_key(|e| e.sample);
            events
        } else if let Some(json) = st.metadata("annotations") {
            let annotations: Vec<Annotation> =
                serde_json::from_str(json).context("parsing annotations metadata")?;
            events_from_annotations(&annotations, sfreq, signal.n_times())
        } else {
            log::warn!("{} holds no events", path.display());
            vec![]
        };

        let ica = if st.has("ica_mixing") {
            let mixing = st.array2("ica_mixing")?;
            let unmixing = st.array2("ica_unmixing")?;
            let model = if st.has("ica_mean") {
                IcaModel::new(mixing, unmixing, Array1::from_vec(st.f64_tensor("ica_mean")?.0))?
            } else {
                IcaModel::without_mean(mixing, unmixing)?
            };
            Some(model)
        } else {
            None
        };

        log::info!(
            "loaded {} ch × {} samples @ {} Hz, {} events{}",
            signal.n_channels(),
            signal.n_times(),
            signal.sfreq(),
            events.len(),
            if ica.is_some() { ", ICA model" } else { "" }
        );
        Ok(Self { signal, events, ica })
    }
}

// ── Generic safetensors builder ──────────────────────────────────────────────

/// Simple safetensors file writer for F64, I32 and UTF-8 (U8) tensors.
///
/// Usage:
/// ```rust,no_run
/// use eegtf::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("signal", &[1.0f64, 2.0, 3.0], &[1, 3]);
/// w.add_strings("names", &["Fz".to_string(), "Oz".to_string()]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    /// Any-dimensional f64 array, written in logical (row-major) order.
    pub fn add_f64_array<D: Dimension>(&mut self, name: &str, arr: &Array<f64, D>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, arr.shape());
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    pub fn add_i64(&mut self, name: &str, data: &[i64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I64", shape.to_vec()));
    }

    /// Newline-joined UTF-8 bytes.
    pub fn add_strings(&mut self, name: &str, items: &[String]) {
        let bytes = items.join("\n").into_bytes();
        let n = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![n]));
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        if !self.metadata.is_empty() {
            header_map.insert("__metadata__".into(), serde_json::Value::Object(self.metadata.clone()));
        }
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}
