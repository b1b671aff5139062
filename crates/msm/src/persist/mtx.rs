//! Matrix Market coordinate codec for sparse matrices.
//!
//! Encoding and decoding go through `sprs::io`. Files are screened first so
//! that a malformed header or an absurd entry count is reported as a parse
//! error before anything is allocated for it.

use std::fs;
use std::path::Path;

use super::Artifact;
use crate::error::MsmError;
use crate::sparse::SparseMatrix;

const NAME: &str = "matrix market";

fn parse_err(reason: impl Into<String>) -> MsmError {
    MsmError::Parse {
        artifact: NAME,
        reason: reason.into(),
    }
}

fn check_banner(line: &str) -> Result<(), MsmError> {
    let tokens: Vec<String> = line.split_whitespace().map(str::to_ascii_lowercase).collect();
    match tokens.as_slice() {
        [banner, object, format, field, symmetry]
            if banner == "%%matrixmarket" && object == "matrix" && format == "coordinate" =>
        {
            if field != "real" && field != "integer" {
                return Err(parse_err(format!("unsupported field type {field:?}")));
            }
            if symmetry != "general" && symmetry != "symmetric" {
                return Err(parse_err(format!("unsupported symmetry {symmetry:?}")));
            }
            Ok(())
        }
        _ => Err(parse_err(format!("invalid banner line {line:?}"))),
    }
}

fn parse_fields<const N: usize>(line: &str) -> Result<[&str; N], MsmError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    fields.try_into().map_err(|f: Vec<&str>| {
        parse_err(format!("expected {N} fields, got {}: {line:?}", f.len()))
    })
}

fn parse_count(token: &str) -> Result<usize, MsmError> {
    token
        .parse()
        .map_err(|e| parse_err(format!("bad size {token:?}: {e}")))
}

fn check_index(token: &str, bound: usize) -> Result<(), MsmError> {
    let one_based: usize = token
        .parse()
        .map_err(|e| parse_err(format!("bad index {token:?}: {e}")))?;
    if one_based == 0 || one_based > bound {
        return Err(parse_err(format!("index {one_based} outside 1..={bound}")));
    }
    Ok(())
}

/// Validates the banner, the size line and every entry line of `text`
/// without allocating per declared entry.
///
/// Reads `general` and `symmetric` coordinate matrices with `real` or
/// `integer` values; the declared count is the number of stored lines.
fn check_entries(text: &str) -> Result<(), MsmError> {
    let mut lines = text.lines();
    let banner = lines.next().ok_or_else(|| parse_err("empty file"))?;
    check_banner(banner)?;

    let mut content = lines.filter(|l| !(l.trim().is_empty() || l.starts_with('%')));
    let size = content.next().ok_or_else(|| parse_err("missing size line"))?;
    let [rows, cols, nnz] = parse_fields::<3>(size)?;
    let (n_rows, n_cols, nnz) = (parse_count(rows)?, parse_count(cols)?, parse_count(nnz)?);

    let mut found = 0usize;
    for line in content {
        let [i, j, v] = parse_fields::<3>(line)?;
        check_index(i, n_rows)?;
        check_index(j, n_cols)?;
        v.parse::<f64>()
            .map_err(|e| parse_err(format!("bad value {v:?}: {e}")))?;
        found += 1;
    }
    if found != nnz {
        return Err(parse_err(format!("declared {nnz} entries, found {found}")));
    }
    Ok(())
}

impl Artifact for SparseMatrix {
    fn write_file(&self, path: &Path) -> Result<(), MsmError> {
        sprs::io::write_matrix_market(path, self.as_csmat())?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Self, MsmError> {
        check_entries(&fs::read_to_string(path)?)?;
        let tri = sprs::io::read_matrix_market::<f64, usize, _>(path)
            .map_err(|e| parse_err(e.to_string()))?;
        let triplets = tri
            .row_inds()
            .iter()
            .zip(tri.col_inds())
            .zip(tri.data())
            .map(|((&i, &j), &v)| (i, j, v));
        SparseMatrix::from_triplets(tri.rows(), tri.cols(), triplets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Result<SparseMatrix, MsmError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.mtx");
        fs::write(&path, text).unwrap();
        SparseMatrix::read_file(&path)
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.mtx");
        let m = SparseMatrix::from_dense(&[vec![0.0, 2.0 / 3.0], vec![1e-20, 4.0]]).unwrap();
        m.write_file(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.to_ascii_lowercase().starts_with("%%matrixmarket matrix coordinate"));
        assert_eq!(SparseMatrix::read_file(&path).unwrap(), m);
    }

    #[test]
    fn reads_comments_and_integers() {
        let text = "%%MatrixMarket matrix coordinate integer general\n\
                    % written elsewhere\n\
                    \n\
                    2 3 2\n\
                    1 3 5\n\
                    2 1 7\n";
        let m = read(text).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(0, 2), 5.0);
        assert_eq!(m.get(1, 0), 7.0);
    }

    #[test]
    fn expands_symmetric_storage() {
        let text = "%%MatrixMarket matrix coordinate real symmetric\n2 2 2\n1 1 1.5\n2 1 0.5\n";
        let m = read(text).unwrap();
        assert_eq!(m.to_dense(), vec![vec![1.5, 0.5], vec![0.5, 0.0]]);
    }

    #[test]
    fn rejects_dense_format() {
        let text = "%%MatrixMarket matrix array real general\n1 1\n1.0\n";
        assert!(matches!(read(text), Err(MsmError::Parse { .. })));
    }

    #[test]
    fn rejects_wrong_entry_count() {
        let text = "%%MatrixMarket matrix coordinate real general\n2 2 2\n1 1 1.0\n";
        assert!(matches!(read(text), Err(MsmError::Parse { .. })));
    }

    #[test]
    fn rejects_huge_declared_entry_count() {
        let text = "%%MatrixMarket matrix coordinate real general\n2 2 18446744073709551615\n";
        let err = read(text).unwrap_err();
        assert!(matches!(err, MsmError::Parse { artifact: NAME, .. }));
        assert!(err.to_string().contains("18446744073709551615"));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let text = "%%MatrixMarket matrix coordinate real general\n2 2 1\n3 1 1.0\n";
        assert!(matches!(read(text), Err(MsmError::Parse { .. })));
    }
}
