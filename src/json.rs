//! Deterministic JSON writer for sidecars and dataset descriptions.
//!
//! Keys are sorted and indentation is fixed at four spaces, so repeated runs
//! over identical inputs produce byte-identical files. The sorting comes from
//! normalizing through `serde_json::Value`, whose object map is a `BTreeMap`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{Error, Result};

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json_err = |source| Error::Json { path: path.to_path_buf(), source };
    let value = serde_json::to_value(value).map_err(json_err)?;

    let file = File::create(path).map_err(Error::io(path))?;
    let mut buf = BufWriter::new(file);
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).map_err(json_err)?;
    buf.flush().map_err(Error::io(path))?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(Error::io(path))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| Error::Json { path: path.to_path_buf(), source })
}
