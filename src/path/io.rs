use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::LieIncrementPath;

/// Load a path from `param,x1,...,xw` rows.
///
/// Blank lines and `#` comments are skipped; the width is taken from the
/// first data row and every later row must match it.
pub fn read_increment_csv<P: AsRef<Path>>(path: P, depth: u8) -> Result<LieIncrementPath> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut width = None;
    let mut params = Vec::new();
    let mut data = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let values = line
            .split(',')
            .map(|field| {
                field.trim().parse::<f64>().with_context(|| {
                    format!("invalid number '{}' on line {}", field.trim(), line_no + 1)
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let (param, increment) = values
            .split_first()
            .ok_or_else(|| anyhow!("empty row on line {}", line_no + 1))?;
        let row_width = *width.get_or_insert(increment.len());
        if increment.len() != row_width {
            return Err(anyhow!(
                "line {} has {} coordinates, expected {}",
                line_no + 1,
                increment.len(),
                row_width
            ));
        }

        params.push(*param);
        data.extend_from_slice(increment);
    }

    let width = width.ok_or_else(|| anyhow!("no increments in {}", path.display()))?;
    LieIncrementPath::new(width, depth, params, &data)
        .with_context(|| format!("invalid path data in {}", path.display()))
}
