//! CSV codec for trim mappings.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use super::StreamArtifact;
use crate::error::MsmError;
use crate::trim::TrimMapping;

#[derive(Serialize, Deserialize)]
struct Row {
    original: usize,
    trimmed: usize,
}

fn csv_err(e: csv::Error) -> MsmError {
    MsmError::Parse {
        artifact: TrimMapping::NAME,
        reason: e.to_string(),
    }
}

impl StreamArtifact for TrimMapping {
    const NAME: &'static str = "mapping";

    fn write_to<W: Write>(&self, writer: W) -> Result<(), MsmError> {
        let mut csv = csv::Writer::from_writer(writer);
        for (original, trimmed) in self.iter() {
            csv.serialize(Row { original, trimmed }).map_err(csv_err)?;
        }
        csv.flush()?;
        Ok(())
    }

    fn read_from<R: BufRead>(reader: R) -> Result<Self, MsmError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let pairs = csv
            .deserialize::<Row>()
            .map(|row| row.map(|r| (r.original, r.trimmed)).map_err(csv_err))
            .collect::<Result<Vec<_>, _>>()?;
        TrimMapping::from_pairs(pairs)
    }
}
