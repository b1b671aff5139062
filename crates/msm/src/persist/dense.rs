//! Newline-separated codec for equilibrium vectors.

use std::io::{BufRead, Write};

use super::StreamArtifact;
use crate::error::MsmError;

impl StreamArtifact for Vec<f64> {
    const NAME: &'static str = "equilibrium probabilities";

    fn write_to<W: Write>(&self, mut writer: W) -> Result<(), MsmError> {
        for value in self {
            writeln!(writer, "{value:e}")?;
        }
        Ok(())
    }

    fn read_from<R: BufRead>(reader: R) -> Result<Self, MsmError> {
        let mut values = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let token = line.trim();
            if token.is_empty() {
                continue;
            }
            let value: f64 = token.parse().map_err(|e| MsmError::Parse {
                artifact: Self::NAME,
                reason: format!("line {}: {token:?}: {e}", line_no + 1),
            })?;
            values.push(value);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_round_trip() {
        let values = vec![1.0 / 3.0, 2.0 / 3.0, 1e-300, 0.0];
        let mut buf = Vec::new();
        values.write_to(&mut buf).unwrap();
        assert_eq!(Vec::<f64>::read_from(buf.as_slice()).unwrap(), values);
    }

    #[test]
    fn tolerates_missing_trailing_newline() {
        let values = Vec::<f64>::read_from("0.25\n0.75".as_bytes()).unwrap();
        assert_eq!(values, vec![0.25, 0.75]);
    }

    #[test]
    fn rejects_non_numbers() {
        let result = Vec::<f64>::read_from("0.5\nhalf\n".as_bytes());
        assert!(matches!(result, Err(MsmError::Parse { .. })));
    }
}
