//! Scan file readers
//!
//! Only vertex coordinates are extracted. Text formats are parsed line by
//! line; PLY and STL also have binary layouts, and VTK files go through
//! `vtkio`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;
use vtkio::model::{DataSet, Piece, Vtk};

use super::Point3;
use crate::error::{Result, TdaError};

/// File formats understood by [`load_scan`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFormat {
    Obj,
    Off,
    Ply,
    Stl,
    Xyz,
    Vtk,
}

impl ScanFormat {
    /// Pick the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| TdaError::UnsupportedFormat(path.display().to_string()))?;

        match ext.as_str() {
            "obj" => Ok(ScanFormat::Obj),
            "off" => Ok(ScanFormat::Off),
            "ply" => Ok(ScanFormat::Ply),
            "stl" => Ok(ScanFormat::Stl),
            "xyz" | "pts" | "txt" => Ok(ScanFormat::Xyz),
            "vtk" | "vtu" | "vtp" => Ok(ScanFormat::Vtk),
            _ => Err(TdaError::UnsupportedFormat(ext)),
        }
    }
}

/// Load a 3D scan and return its vertices in file order
pub fn load_scan(path: impl AsRef<Path>) -> Result<Vec<Point3>> {
    let path = path.as_ref();
    let format = ScanFormat::from_path(path)?;

    let points = match format {
        ScanFormat::Vtk => load_vtk(path)?,
        _ => {
            let bytes = std::fs::read(path).map_err(|e| TdaError::io(path, e))?;
            parse_bytes(format, &bytes, path)?
        }
    };

    debug!(path = %path.display(), ?format, n_points = points.len(), "loaded scan");
    Ok(points)
}

/// Write points as `x y z` rows; the output reloads through [`load_scan`]
pub fn write_xyz(path: impl AsRef<Path>, points: &[Point3]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| TdaError::io(path, e))?;
    let mut out = BufWriter::new(file);

    for p in points {
        writeln!(out, "{} {} {}", p[0], p[1], p[2]).map_err(|e| TdaError::io(path, e))?;
    }
    out.flush().map_err(|e| TdaError::io(path, e))?;

    debug!(path = %path.display(), n_points = points.len(), "wrote xyz");
    Ok(())
}

pub(crate) fn parse_bytes(format: ScanFormat, bytes: &[u8], path: &Path) -> Result<Vec<Point3>> {
    match format {
        ScanFormat::Obj => parse_obj(as_text(bytes, path)?, path),
        ScanFormat::Off => parse_off(as_text(bytes, path)?, path),
        ScanFormat::Xyz => parse_xyz(as_text(bytes, path)?, path),
        ScanFormat::Ply => parse_ply(bytes, path),
        ScanFormat::Stl => parse_stl(bytes, path),
        ScanFormat::Vtk => Err(TdaError::UnsupportedFormat(
            "VTK data must be loaded from a file".into(),
        )),
    }
}

fn as_text<'a>(bytes: &'a [u8], path: &Path) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| {
        TdaError::parse(path, format!("byte {}", e.valid_up_to()), "file is not valid UTF-8")
    })
}

fn strip_comment(line: &str) -> &str {
    let code = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    code.trim()
}

fn parse_coords<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    path: &Path,
    line_no: usize,
) -> Result<Point3> {
    let mut point = [0.0; 3];
    for (axis, slot) in point.iter_mut().enumerate() {
        let token = tokens.next().ok_or_else(|| {
            TdaError::parse(
                path,
                format!("line {line_no}"),
                format!("vertex has {axis} coordinates, expected 3"),
            )
        })?;
        *slot = token.parse::<f64>().map_err(|e| {
            TdaError::parse(path, format!("line {line_no}"), format!("`{token}`: {e}"))
        })?;
    }
    Ok(point)
}

fn parse_obj(text: &str, path: &Path) -> Result<Vec<Point3>> {
    let mut points = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let mut tokens = strip_comment(raw).split_whitespace();
        if tokens.next() == Some("v") {
            points.push(parse_coords(tokens, path, idx + 1)?);
        }
    }
    Ok(points)
}

fn parse_off(text: &str, path: &Path) -> Result<Vec<Point3>> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, strip_comment(raw)))
        .filter(|(_, line)| !line.is_empty());

    let missing_header = || TdaError::parse(path, "line 1", "missing OFF vertex count");

    let (first_no, first) = lines.next().ok_or_else(missing_header)?;
    let mut tokens: Vec<&str> = first.split_whitespace().collect();
    let mut counts_line = first_no;
    if tokens.first().map_or(false, |t| t.ends_with("OFF")) {
        tokens.remove(0);
        if tokens.is_empty() {
            let (no, line) = lines.next().ok_or_else(missing_header)?;
            counts_line = no;
            tokens = line.split_whitespace().collect();
        }
    }

    let n_vertices: usize = tokens
        .first()
        .ok_or_else(missing_header)?
        .parse()
        .map_err(|e| TdaError::parse(path, format!("line {counts_line}"), format!("vertex count: {e}")))?;

    let mut points = Vec::with_capacity(n_vertices);
    for _ in 0..n_vertices {
        let (no, line) = lines.next().ok_or_else(|| {
            TdaError::parse(
                path,
                "end of file",
                format!("expected {n_vertices} vertices, found {}", points.len()),
            )
        })?;
        points.push(parse_coords(line.split_whitespace(), path, no)?);
    }
    Ok(points)
}

fn parse_xyz(text: &str, path: &Path) -> Result<Vec<Point3>> {
    let mut points = Vec::new();
    let mut seen_data = false;

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();

        // .pts files open with a bare point count
        if !seen_data && tokens.len() == 1 && tokens[0].parse::<usize>().is_ok() {
            seen_data = true;
            continue;
        }
        seen_data = true;
        points.push(parse_coords(tokens.into_iter(), path, idx + 1)?);
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// STL
// ---------------------------------------------------------------------------

fn parse_stl(bytes: &[u8], path: &Path) -> Result<Vec<Point3>> {
    let mut dedup = PointDedup::default();

    if is_binary_stl(bytes) {
        let n_triangles = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
        for t in 0..n_triangles {
            // 12 bytes normal, 3 × 12 bytes corners, 2 bytes attribute count
            let base = 84 + t * 50 + 12;
            for corner in 0..3 {
                let offset = base + corner * 12;
                let mut p = [0.0; 3];
                for (axis, slot) in p.iter_mut().enumerate() {
                    let at = offset + axis * 4;
                    let raw = [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
                    *slot = f32::from_le_bytes(raw) as f64;
                }
                dedup.insert(p);
            }
        }
        return Ok(dedup.into_points());
    }

    let text = as_text(bytes, path)?;
    if !text.trim_start().starts_with("solid") {
        return Err(TdaError::parse(path, "byte 0", "neither ASCII nor binary STL"));
    }
    for (idx, raw) in text.lines().enumerate() {
        let mut tokens = raw.split_whitespace();
        if tokens.next() == Some("vertex") {
            dedup.insert(parse_coords(tokens, path, idx + 1)?);
        }
    }
    Ok(dedup.into_points())
}

fn is_binary_stl(bytes: &[u8]) -> bool {
    if bytes.len() < 84 {
        return false;
    }
    let n = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    n.checked_mul(50)
        .and_then(|b| b.checked_add(84))
        .map_or(false, |expected| expected == bytes.len())
}

/// Unique points in first-seen order, keyed on exact bit patterns
#[derive(Default)]
struct PointDedup {
    index: HashMap<[u64; 3], usize>,
    points: Vec<Point3>,
}

impl PointDedup {
    fn insert(&mut self, p: Point3) {
        // +0.0 folds -0.0 onto 0.0
        let key = [(p[0] + 0.0).to_bits(), (p[1] + 0.0).to_bits(), (p[2] + 0.0).to_bits()];
        let next = self.points.len();
        if *self.index.entry(key).or_insert(next) == next {
            self.points.push(p);
        }
    }

    fn into_points(self) -> Vec<Point3> {
        self.points
    }
}

// ---------------------------------------------------------------------------
// PLY
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyEncoding {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyScalar {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl PlyScalar {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "int8" => PlyScalar::I8,
            "uchar" | "uint8" => PlyScalar::U8,
            "short" | "int16" => PlyScalar::I16,
            "ushort" | "uint16" => PlyScalar::U16,
            "int" | "int32" => PlyScalar::I32,
            "uint" | "uint32" => PlyScalar::U32,
            "float" | "float32" => PlyScalar::F32,
            "double" | "float64" => PlyScalar::F64,
            _ => return None,
        })
    }

    fn size(self) -> usize {
        match self {
            PlyScalar::I8 | PlyScalar::U8 => 1,
            PlyScalar::I16 | PlyScalar::U16 => 2,
            PlyScalar::I32 | PlyScalar::U32 | PlyScalar::F32 => 4,
            PlyScalar::F64 => 8,
        }
    }

    fn decode(self, raw: &[u8], little_endian: bool) -> f64 {
        macro_rules! num {
            ($t:ty, $n:expr) => {{
                let mut buf = [0u8; $n];
                buf.copy_from_slice(&raw[..$n]);
                if little_endian {
                    <$t>::from_le_bytes(buf) as f64
                } else {
                    <$t>::from_be_bytes(buf) as f64
                }
            }};
        }
        match self {
            PlyScalar::I8 => raw[0] as i8 as f64,
            PlyScalar::U8 => raw[0] as f64,
            PlyScalar::I16 => num!(i16, 2),
            PlyScalar::U16 => num!(u16, 2),
            PlyScalar::I32 => num!(i32, 4),
            PlyScalar::U32 => num!(u32, 4),
            PlyScalar::F32 => num!(f32, 4),
            PlyScalar::F64 => num!(f64, 8),
        }
    }
}

#[derive(Debug, Clone)]
enum PlyProperty {
    Scalar { name: String, kind: PlyScalar },
    List { count: PlyScalar, item: PlyScalar },
}

#[derive(Debug, Clone)]
struct PlyElement {
    name: String,
    count: usize,
    properties: Vec<PlyProperty>,
}

struct PlyHeader {
    encoding: PlyEncoding,
    elements: Vec<PlyElement>,
    body_offset: usize,
}

fn parse_ply_header(bytes: &[u8], path: &Path) -> Result<PlyHeader> {
    const END: &[u8] = b"end_header";
    let end = bytes
        .windows(END.len())
        .position(|w| w == END)
        .ok_or_else(|| TdaError::parse(path, "header", "missing end_header"))?;
    let mut body_offset = end + END.len();
    // end_header is terminated by \n or \r\n
    if bytes.get(body_offset) == Some(&b'\r') {
        body_offset += 1;
    }
    if bytes.get(body_offset) == Some(&b'\n') {
        body_offset += 1;
    }

    let header = as_text(&bytes[..end], path)?;
    let mut lines = header.lines().enumerate();
    match lines.next() {
        Some((_, magic)) if magic.trim() == "ply" => {}
        _ => return Err(TdaError::parse(path, "line 1", "missing `ply` magic")),
    }

    let mut encoding = None;
    let mut elements: Vec<PlyElement> = Vec::new();

    for (idx, line) in lines {
        let loc = || format!("line {}", idx + 1);
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["format", kind, _version] => {
                encoding = Some(match *kind {
                    "ascii" => PlyEncoding::Ascii,
                    "binary_little_endian" => PlyEncoding::BinaryLittleEndian,
                    "binary_big_endian" => PlyEncoding::BinaryBigEndian,
                    other => {
                        return Err(TdaError::parse(path, loc(), format!("unknown format `{other}`")))
                    }
                });
            }
            ["element", name, count] => {
                let count = count
                    .parse()
                    .map_err(|e| TdaError::parse(path, loc(), format!("element count: {e}")))?;
                elements.push(PlyElement {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            ["property", "list", count, item, _name] => {
                let bad = || TdaError::parse(path, loc(), "unknown list property type");
                let property = PlyProperty::List {
                    count: PlyScalar::parse(count).ok_or_else(bad)?,
                    item: PlyScalar::parse(item).ok_or_else(bad)?,
                };
                elements
                    .last_mut()
                    .ok_or_else(|| TdaError::parse(path, loc(), "property before element"))?
                    .properties
                    .push(property);
            }
            ["property", kind, name] => {
                let kind = PlyScalar::parse(kind).ok_or_else(|| {
                    TdaError::parse(path, loc(), format!("unknown property type `{kind}`"))
                })?;
                elements
                    .last_mut()
                    .ok_or_else(|| TdaError::parse(path, loc(), "property before element"))?
                    .properties
                    .push(PlyProperty::Scalar { name: name.to_string(), kind });
            }
            _ => {} // comment, obj_info, blank
        }
    }

    let encoding = encoding.ok_or_else(|| TdaError::parse(path, "header", "missing format line"))?;
    Ok(PlyHeader { encoding, elements, body_offset })
}

fn parse_ply(bytes: &[u8], path: &Path) -> Result<Vec<Point3>> {
    let header = parse_ply_header(bytes, path)?;

    let vertex_pos = header
        .elements
        .iter()
        .position(|e| e.name == "vertex")
        .ok_or_else(|| TdaError::parse(path, "header", "no vertex element"))?;
    let axes = {
        let vertex = &header.elements[vertex_pos];
        let find = |axis: &str| {
            vertex
                .properties
                .iter()
                .position(|p| matches!(p, PlyProperty::Scalar { name, .. } if name == axis))
                .ok_or_else(|| TdaError::parse(path, "header", format!("vertex has no `{axis}` property")))
        };
        [find("x")?, find("y")?, find("z")?]
    };

    let body = &bytes[header.body_offset..];
    let mut reader = match header.encoding {
        PlyEncoding::Ascii => PlyReader::Ascii {
            tokens: as_text(body, path)?.split_whitespace(),
            consumed: 0,
        },
        PlyEncoding::BinaryLittleEndian => PlyReader::Binary { body, offset: 0, little_endian: true },
        PlyEncoding::BinaryBigEndian => PlyReader::Binary { body, offset: 0, little_endian: false },
    };

    let mut points = Vec::new();
    for (element_idx, element) in header.elements.iter().enumerate().take(vertex_pos + 1) {
        let is_vertex = element_idx == vertex_pos;
        if is_vertex {
            points.reserve(element.count);
        }
        let mut row = vec![0.0; element.properties.len()];
        for _ in 0..element.count {
            for (slot, property) in row.iter_mut().zip(&element.properties) {
                match property {
                    PlyProperty::Scalar { kind, .. } => *slot = reader.next(*kind, path)?,
                    PlyProperty::List { count, item } => {
                        let n = reader.next(*count, path)? as usize;
                        for _ in 0..n {
                            reader.next(*item, path)?;
                        }
                    }
                }
            }
            if is_vertex {
                points.push([row[axes[0]], row[axes[1]], row[axes[2]]]);
            }
        }
    }
    Ok(points)
}

enum PlyReader<'a> {
    Ascii {
        tokens: std::str::SplitWhitespace<'a>,
        consumed: usize,
    },
    Binary {
        body: &'a [u8],
        offset: usize,
        little_endian: bool,
    },
}

impl PlyReader<'_> {
    fn next(&mut self, kind: PlyScalar, path: &Path) -> Result<f64> {
        match self {
            PlyReader::Ascii { tokens, consumed } => {
                *consumed += 1;
                let at = format!("body token {consumed}");
                let token = tokens
                    .next()
                    .ok_or_else(|| TdaError::parse(path, at.clone(), "unexpected end of data"))?;
                token
                    .parse::<f64>()
                    .map_err(|e| TdaError::parse(path, at, format!("`{token}`: {e}")))
            }
            PlyReader::Binary { body, offset, little_endian } => {
                let size = kind.size();
                let raw = body.get(*offset..*offset + size).ok_or_else(|| {
                    TdaError::parse(path, format!("body byte {offset}"), "unexpected end of data")
                })?;
                *offset += size;
                Ok(kind.decode(raw, *little_endian))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// VTK
// ---------------------------------------------------------------------------

fn load_vtk(path: &Path) -> Result<Vec<Point3>> {
    let vtk = Vtk::import(path).map_err(|e| TdaError::Vtk {
        path: path.to_path_buf(),
        message: format!("{e:?}"),
    })?;
    let mut coords = Vec::new();
    collect_dataset(vtk.data, path, &mut coords)?;

    if coords.len() % 3 != 0 {
        return Err(TdaError::Vtk {
            path: path.to_path_buf(),
            message: format!("{} coordinates is not a multiple of 3", coords.len()),
        });
    }
    Ok(coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn collect_dataset(data: DataSet, path: &Path, out: &mut Vec<f64>) -> Result<()> {
    match data {
        DataSet::UnstructuredGrid { pieces, .. } => {
            for piece in pieces {
                match piece {
                    Piece::Inline(p) => extend_points(p.points, path, out)?,
                    Piece::Loaded(ds) => collect_dataset(*ds, path, out)?,
                    Piece::Source(src, _) => return Err(external_piece(path, &src)),
                }
            }
        }
        DataSet::PolyData { pieces, .. } => {
            for piece in pieces {
                match piece {
                    Piece::Inline(p) => extend_points(p.points, path, out)?,
                    Piece::Loaded(ds) => collect_dataset(*ds, path, out)?,
                    Piece::Source(src, _) => return Err(external_piece(path, &src)),
                }
            }
        }
        DataSet::StructuredGrid { pieces, .. } => {
            for piece in pieces {
                match piece {
                    Piece::Inline(p) => extend_points(p.points, path, out)?,
                    Piece::Loaded(ds) => collect_dataset(*ds, path, out)?,
                    Piece::Source(src, _) => return Err(external_piece(path, &src)),
                }
            }
        }
        _ => {
            return Err(TdaError::Vtk {
                path: path.to_path_buf(),
                message: "dataset has no explicit point coordinates".into(),
            })
        }
    }
    Ok(())
}

fn extend_points(buffer: vtkio::model::IOBuffer, path: &Path, out: &mut Vec<f64>) -> Result<()> {
    let values = buffer.cast_into::<f64>().ok_or_else(|| TdaError::Vtk {
        path: path.to_path_buf(),
        message: "point coordinates are not numeric".into(),
    })?;
    out.extend(values);
    Ok(())
}

fn external_piece(path: &Path, source: &str) -> TdaError {
    TdaError::Vtk {
        path: path.to_path_buf(),
        message: format!("pieces stored in external file `{source}` are not supported"),
    }
}
