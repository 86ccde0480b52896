//! File export
//!
//! - Extrusion CSV (`x,y,extruding`) from a raw toolpath
//! - Wheel-center CSV to a replayable G-code program

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use afrbkit_core::{Error, Result};
use tracing::{info, warn};

use crate::collector::{linspace_indices, RawToolpath};

/// Default output name for [`wheel_centers_to_gcode`]
pub const DEFAULT_CENTERS_OUTPUT: &str = "wheel_centers_out.gcode";

const CENTERS_HEADER: [&str; 4] = [
    "; Generated from wheel_centers.csv",
    "G90 ; Absolute positioning",
    "G21 ; Set units to mm",
    "G92 X0 Y0 Z0 ; Set current position as zero",
];

const CENTERS_FOOTER: &str = "M2 ; End of program";

/// `<gcode path>_extrude.csv`, next to the input
pub fn default_csv_path(gcode_path: &Path) -> PathBuf {
    let mut name = gcode_path.as_os_str().to_os_string();
    name.push("_extrude.csv");
    PathBuf::from(name)
}

/// Write `x,y,extruding` rows, optionally capped to `max_points`
///
/// Returns the number of data rows written.
pub fn write_extrusion_csv<W: Write>(
    mut out: W,
    raw: &RawToolpath,
    max_points: Option<usize>,
) -> Result<usize> {
    let indices: Vec<usize> = match max_points {
        Some(cap) if raw.len() > cap => linspace_indices(raw.len(), cap),
        _ => (0..raw.len()).collect(),
    };

    writeln!(out, "x,y,extruding")?;
    for &i in &indices {
        writeln!(out, "{:?},{:?},{}", raw.x[i], raw.y[i], raw.extruding[i])?;
    }
    out.flush()?;
    Ok(indices.len())
}

/// Write an extrusion CSV to `path`
pub fn save_extrusion_csv(
    path: impl AsRef<Path>,
    raw: &RawToolpath,
    max_points: Option<usize>,
) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let written = write_extrusion_csv(BufWriter::new(file), raw, max_points)?;
    info!("Wrote {} points to {}", written, path.display());
    Ok(written)
}

fn split_csv_row(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|field| field.trim().trim_matches('"'))
        .collect()
}

/// Column positions of the wheel-center fields
struct CenterColumns {
    x: Option<usize>,
    y: Option<usize>,
    z: Option<usize>,
    angle: Option<usize>,
}

impl CenterColumns {
    fn from_header(header: &str) -> Self {
        let names = split_csv_row(header);
        let find = |name: &str| names.iter().position(|&n| n == name);
        Self {
            x: find("center_x"),
            y: find("center_y"),
            z: find("center_z"),
            angle: find("angle_deg"),
        }
    }
}

fn field<'a>(fields: &[&'a str], column: Option<usize>) -> Option<&'a str> {
    column
        .and_then(|c| fields.get(c).copied())
        .filter(|value| !value.is_empty())
}

/// Convert a wheel-center CSV into a G-code program
///
/// Coordinates are copied through as written. Rows without both X and Y are
/// skipped. Returns the number of `G1` lines emitted.
pub fn wheel_centers_to_gcode<R: BufRead, W: Write>(input: R, mut output: W) -> Result<usize> {
    let mut lines = input.lines();
    let columns = match lines.next() {
        Some(header) => CenterColumns::from_header(&header?),
        None => return Err(Error::other("wheel center CSV is empty")),
    };
    if columns.x.is_none() || columns.y.is_none() {
        warn!("wheel center CSV has no center_x/center_y columns; no moves will be written");
    }

    for line in CENTERS_HEADER {
        writeln!(output, "{}", line)?;
    }

    let mut moves = 0;
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_row(&line);
        let (Some(x), Some(y)) = (field(&fields, columns.x), field(&fields, columns.y)) else {
            continue;
        };

        let mut cmd = format!("G1 X{} Y{}", x, y);
        if let Some(z) = field(&fields, columns.z) {
            cmd.push_str(&format!(" Z{}", z));
        }
        if let Some(a) = field(&fields, columns.angle) {
            cmd.push_str(&format!(" A{}", a));
        }
        writeln!(output, "{}", cmd)?;
        moves += 1;
    }

    writeln!(output, "{}", CENTERS_FOOTER)?;
    output.flush()?;
    Ok(moves)
}

/// File-to-file form of [`wheel_centers_to_gcode`]
pub fn convert_wheel_centers(csv_path: impl AsRef<Path>, gcode_path: impl AsRef<Path>) -> Result<usize> {
    let (csv_path, gcode_path) = (csv_path.as_ref(), gcode_path.as_ref());
    let input = BufReader::new(File::open(csv_path)?);
    let output = BufWriter::new(File::create(gcode_path)?);
    let moves = wheel_centers_to_gcode(input, output)?;
    info!("Wrote G-code to {} ({} moves)", gcode_path.display(), moves);
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use afrbkit_core::PositionSample;

    fn raw(n: usize) -> RawToolpath {
        (0..n)
            .map(|i| PositionSample::new(i as f64, 0.5, 0.0, i % 2 == 0))
            .collect()
    }

    #[test]
    fn test_default_csv_path_appends_suffix() {
        assert_eq!(
            default_csv_path(Path::new("parts/bracket.gcode")),
            PathBuf::from("parts/bracket.gcode_extrude.csv")
        );
    }

    #[test]
    fn test_extrusion_csv_rows() {
        let mut out = Vec::new();
        let written = write_extrusion_csv(&mut out, &raw(2), None).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "x,y,extruding\n0.0,0.5,1\n1.0,0.5,0\n"
        );
    }

    #[test]
    fn test_extrusion_csv_capped() {
        let mut out = Vec::new();
        let written = write_extrusion_csv(&mut out, &raw(10), Some(4)).unwrap();
        assert_eq!(written, 4);
        let text = String::from_utf8(out).unwrap();
        let xs: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(xs, vec!["0.0", "3.0", "6.0", "9.0"]);
    }

    #[test]
    fn test_wheel_centers_program() {
        let csv = "center_x,center_y,center_z,angle_deg\n1.5,2,0.3,90\n3,4,,\n,5,1,0\n";
        let mut out = Vec::new();
        let moves = wheel_centers_to_gcode(csv.as_bytes(), &mut out).unwrap();
        assert_eq!(moves, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "; Generated from wheel_centers.csv");
        assert_eq!(lines[3], "G92 X0 Y0 Z0 ; Set current position as zero");
        assert_eq!(lines[4], "G1 X1.5 Y2 Z0.3 A90");
        assert_eq!(lines[5], "G1 X3 Y4");
        assert_eq!(lines[6], "M2 ; End of program");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_wheel_centers_column_order_and_extras() {
        let csv = "frame,angle_deg,center_y,center_x\n0,45,2,1\n";
        let mut out = Vec::new();
        wheel_centers_to_gcode(csv.as_bytes(), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("G1 X1 Y2 A45\n"));
    }

    #[test]
    fn test_wheel_centers_empty_input() {
        let mut out = Vec::new();
        assert!(wheel_centers_to_gcode("".as_bytes(), &mut out).is_err());
    }
}
