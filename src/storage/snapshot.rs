//! Directory-backed snapshot files in the interchange format.
//!
//! Each iteration writes `fronts.N` into the store directory:
//!
//! ```text
//! fronts = ((
//!     ((p1, p2), (o1, o2), (e1, e2), (s1, s2)),
//! ),)
//! ```
//!
//! one line per archive entry, full snapshot per file, never appended.
//! External plotting and inspection tools consume these files directly, so
//! the layout (including single-element tuples rendered as `(x,)`) is part
//! of the contract. [`read_snapshot`] parses the format back.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;

use super::FrontStore;
use crate::pareto::FrontEntry;
use crate::{Error, Result};

/// A [`FrontStore`] writing one `fronts.N` file per iteration.
///
/// Writes take an exclusive file lock so a concurrently polling plotter
/// never observes a half-written snapshot; [`read_snapshot`] takes a shared
/// lock for the same reason.
pub struct DirectoryFrontStore {
    dir: PathBuf,
    /// Serialise in-process writes so the file lock is held briefly.
    write_lock: Mutex<()>,
}

impl DirectoryFrontStore {
    /// Creates a store rooted at `dir`. The directory is created on the
    /// first write.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// The directory snapshots are written into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for one iteration.
    #[must_use]
    pub fn snapshot_path(&self, iteration: usize) -> PathBuf {
        self.dir.join(format!("fronts.{iteration}"))
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        let _guard = self.write_lock.lock();

        std::fs::create_dir_all(&self.dir).map_err(|e| Error::Storage(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::Storage(e.to_string()))?;

        file.lock_exclusive()
            .map_err(|e| Error::Storage(e.to_string()))?;

        let result = file
            .write_all(contents.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| Error::Storage(e.to_string()));

        FileExt::unlock(&file).map_err(|e| Error::Storage(e.to_string()))?;
        result
    }

    /// Writes the run configuration as `config.json` next to the snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if serialization or the write fails.
    #[cfg(feature = "serde")]
    pub fn save_config(&self, config: &crate::SwarmConfig) -> Result<()> {
        let json =
            serde_json::to_string_pretty(config).map_err(|e| Error::Storage(e.to_string()))?;
        self.write_file(&self.dir.join("config.json"), &json)
    }
}

impl FrontStore for DirectoryFrontStore {
    fn dump(&self, iteration: usize, front: &[FrontEntry]) -> Result<()> {
        self.write_file(&self.snapshot_path(iteration), &render_snapshot(front))
    }

    fn record_details(&self, details: &str) -> Result<()> {
        self.write_file(&self.dir.join("details.txt"), details)
    }
}

/// Renders a front in the interchange format.
fn render_snapshot(front: &[FrontEntry]) -> String {
    let mut out = String::from("fronts = ((\n");
    for entry in front {
        out.push_str("    (");
        out.push_str(&render_tuple(&entry.position));
        out.push_str(", ");
        out.push_str(&render_tuple(&entry.objectives));
        out.push_str(", ");
        out.push_str(&render_tuple(&entry.error));
        out.push_str(", ");
        out.push_str(&render_tuple(&entry.std_dev));
        out.push_str("),\n");
    }
    out.push_str("),)\n");
    out
}

/// Renders a float tuple, keeping the `(x,)` form for single elements.
fn render_tuple(values: &[f64]) -> String {
    let mut out = String::from("(");
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("{v:?}"));
    }
    if values.len() == 1 {
        out.push(',');
    }
    out.push(')');
    out
}

/// Parses a `fronts.N` snapshot file back into archive entries.
///
/// # Errors
///
/// Returns [`Error::Storage`] if the file cannot be read or does not follow
/// the interchange format.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Vec<FrontEntry>> {
    let mut file = File::open(path.as_ref()).map_err(|e| Error::Storage(e.to_string()))?;
    file.lock_shared()
        .map_err(|e| Error::Storage(e.to_string()))?;

    let mut contents = String::new();
    let read = file
        .read_to_string(&mut contents)
        .map_err(|e| Error::Storage(e.to_string()));
    FileExt::unlock(&file).map_err(|e| Error::Storage(e.to_string()))?;
    read?;

    parse_snapshot(&contents)
}

/// Parses the textual snapshot format.
fn parse_snapshot(contents: &str) -> Result<Vec<FrontEntry>> {
    let body = contents
        .trim()
        .strip_prefix("fronts")
        .and_then(|rest| rest.trim_start().strip_prefix('='))
        .ok_or_else(|| Error::Storage("snapshot missing 'fronts =' header".into()))?;

    let value = TupleParser::new(body).parse()?;

    // The root is a 1-tuple wrapping the tuple of entries.
    let Value::Tuple(root) = value else {
        return Err(Error::Storage("snapshot root is not a tuple".into()));
    };
    let Some(Value::Tuple(entries)) = root.into_iter().next() else {
        return Err(Error::Storage("snapshot has no front tuple".into()));
    };

    entries
        .into_iter()
        .map(|entry| {
            let Value::Tuple(fields) = entry else {
                return Err(Error::Storage("front entry is not a tuple".into()));
            };
            let mut tuples = fields.into_iter().map(|field| match field {
                Value::Tuple(values) => values
                    .into_iter()
                    .map(|v| match v {
                        Value::Number(n) => Ok(n),
                        Value::Tuple(_) => {
                            Err(Error::Storage("nested tuple where number expected".into()))
                        }
                    })
                    .collect::<Result<Vec<f64>>>(),
                Value::Number(_) => Err(Error::Storage("number where tuple expected".into())),
            });

            let mut next = |name: &str| {
                tuples
                    .next()
                    .ok_or_else(|| Error::Storage(format!("front entry missing {name}")))?
            };

            Ok(FrontEntry {
                position: next("position")?,
                objectives: next("objectives")?,
                error: next("error")?,
                std_dev: next("std_dev")?,
            })
        })
        .collect()
}

/// A parsed Python-literal value: nested tuples of numbers.
enum Value {
    Tuple(Vec<Value>),
    Number(f64),
}

/// Minimal recursive-descent parser for nested float tuples with trailing
/// commas.
struct TupleParser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> TupleParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Value> {
        self.skip_whitespace();
        let value = self.parse_value()?;
        Ok(value)
    }

    fn skip_whitespace(&mut self) {
        while self
            .input
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.input.get(self.pos) {
            Some(b'(') => self.parse_tuple(),
            Some(_) => self.parse_number(),
            None => Err(Error::Storage("unexpected end of snapshot".into())),
        }
    }

    fn parse_tuple(&mut self) -> Result<Value> {
        self.pos += 1; // consume '('
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.input.get(self.pos) {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(Value::Tuple(items));
                }
                Some(b',') => {
                    self.pos += 1;
                }
                Some(_) => items.push(self.parse_value()?),
                None => return Err(Error::Storage("unterminated tuple in snapshot".into())),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        while self.input.get(self.pos).is_some_and(|b| {
            b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E')
        }) {
            self.pos += 1;
        }
        let text = core::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| Error::Storage("invalid number in snapshot".into()))?;
        text.parse::<f64>()
            .map(Value::Number)
            .map_err(|e| Error::Storage(format!("invalid number '{text}': {e}")))
    }
}
