//! Safetensors export.
//!
//! The core defines no persistence format; this module is the edge that
//! hands derived artifacts (layout coordinates, extracted trials) to other
//! tooling as plain safetensors files. Header via `serde_json`, tensors as
//! little-endian bytes.
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array2;

use crate::container::ContainerData;
use crate::trial::Duration;

/// Minimal safetensors writer for F64 and I32 tensors.
struct TensorWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl TensorWriter {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn add_f64<I: IntoIterator<Item = f64>>(&mut self, name: &str, values: I, shape: &[usize]) {
        let bytes: Vec<u8> = values.into_iter().flat_map(f64::to_le_bytes).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    fn add_i32(&mut self, name: &str, value: i32) {
        self.entries
            .push((name.to_string(), value.to_le_bytes().to_vec(), "I32", vec![1]));
    }

    fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;

        let mut header = serde_json::Map::new();
        let mut offset = 0usize;
        for (name, bytes, dtype, shape) in &self.entries {
            header.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": dtype,
                    "shape": shape,
                    "data_offsets": [offset, offset + bytes.len()],
                }),
            );
            offset += bytes.len();
        }
        let hdr = serde_json::to_vec(&header)?;
        let pad = (8 - hdr.len() % 8) % 8;
        let padded: Vec<u8> = hdr.into_iter().chain(std::iter::repeat(b' ').take(pad)).collect();

        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, bytes, _, _) in &self.entries {
            f.write_all(bytes)?;
        }
        Ok(())
    }
}

/// Write an `[N, 3]` layout coordinate set as a single `xyz` tensor.
pub fn export_layout(xyz: &Array2<f64>, path: &Path) -> Result<()> {
    let mut w = TensorWriter::new();
    w.add_f64("xyz", xyz.iter().copied(), xyz.shape());
    w.write(path)
}

/// Write a duration's extracted trials, one tensor per trial per
/// container (`trial{t}_cont{j}` / `trial{t}_bin{j}`), plus an `n_trials`
/// scalar. Fails if trials have not been extracted yet.
pub fn export_trials(duration: &Duration, path: &Path) -> Result<()> {
    let Some(trials) = duration.trials.as_ref() else {
        bail!("no trials extracted; call extract_trials first");
    };

    let mut w = TensorWriter::new();
    w.add_i32("n_trials", trials.len() as i32);
    for (t, trial) in trials.iter().enumerate() {
        for (j, c) in trial.conts.iter().enumerate() {
            add_container(&mut w, &format!("trial{t}_cont{j}"), &c.data);
        }
        for (j, b) in trial.bins.iter().enumerate() {
            add_container(&mut w, &format!("trial{t}_bin{j}"), &b.data);
        }
    }
    w.write(path)
}

fn add_container(w: &mut TensorWriter, name: &str, data: &ContainerData) {
    match data {
        ContainerData::TwoD(a) => w.add_f64(name, a.iter().copied(), a.shape()),
        ContainerData::ThreeD(a) => w.add_f64(name, a.iter().copied(), a.shape()),
    }
}
