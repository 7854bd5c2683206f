// Geometry command stream interpretation.
//
// A feature's geometry is a sequence of command integers, each followed by
// parameters: `(count << 3) | id`, where MoveTo (1) and LineTo (2) take
// `count` zigzag-encoded (dx, dy) pairs relative to the previous point and
// ClosePath (7) takes none. The cursor starts at (0, 0) for every feature.

use crate::error::DecodeError;
use crate::pbf::varint::zigzag_decode32;

pub const CMD_MOVE_TO: u32 = 1;
pub const CMD_LINE_TO: u32 = 2;
pub const CMD_CLOSE_PATH: u32 = 7;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A position in tile coordinates (0..extent on each axis for in-tile points,
/// though buffers may extend past either edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Inclusive bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BBox {
    fn at(p: Point) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    fn extend(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }
}

/// One decoded command with absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveTo(Point),
    LineTo(Point),
    ClosePath,
}

// ---------------------------------------------------------------------------
// Command iterator
// ---------------------------------------------------------------------------

/// Walks a raw command stream, yielding absolute-coordinate commands.
///
/// Iteration stops after the first error.
#[derive(Debug, Clone)]
pub struct Commands<'a> {
    data: &'a [u32],
    pos: usize,
    cmd: u32,
    remaining: u32,
    cursor: Point,
    failed: bool,
}

impl<'a> Commands<'a> {
    pub fn new(data: &'a [u32]) -> Self {
        Self {
            data,
            pos: 0,
            cmd: 0,
            remaining: 0,
            cursor: Point::default(),
            failed: false,
        }
    }

    fn fail(&mut self, e: DecodeError) -> Option<Result<Command, DecodeError>> {
        self.failed = true;
        Some(Err(e))
    }
}

impl Iterator for Commands<'_> {
    type Item = Result<Command, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while self.remaining == 0 {
            let &ci = self.data.get(self.pos)?;
            self.pos += 1;
            let (id, count) = (ci & 0x7, ci >> 3);
            match id {
                CMD_MOVE_TO | CMD_LINE_TO => {
                    self.cmd = id;
                    self.remaining = count;
                }
                CMD_CLOSE_PATH => {
                    if count != 1 {
                        return self.fail(DecodeError::malformed(format!(
                            "ClosePath with count {count}"
                        )));
                    }
                    return Some(Ok(Command::ClosePath));
                }
                other => {
                    return self.fail(DecodeError::malformed(format!(
                        "unknown geometry command {other}"
                    )));
                }
            }
        }

        self.remaining -= 1;
        let Some(params) = self.data.get(self.pos..self.pos + 2) else {
            return self.fail(DecodeError::Truncated);
        };
        self.pos += 2;

        let dx = zigzag_decode32(params[0]);
        let dy = zigzag_decode32(params[1]);
        let (Some(x), Some(y)) = (self.cursor.x.checked_add(dx), self.cursor.y.checked_add(dy))
        else {
            return self.fail(DecodeError::malformed("geometry coordinate overflow"));
        };
        self.cursor = Point::new(x, y);

        Some(Ok(if self.cmd == CMD_MOVE_TO {
            Command::MoveTo(self.cursor)
        } else {
            Command::LineTo(self.cursor)
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decode into lines (LineString) or rings (Polygon); points yield one
/// single-point line per MoveTo. ClosePath repeats the ring's first point.
pub fn decode_geometry(data: &[u32]) -> Result<Vec<Vec<Point>>, DecodeError> {
    let mut lines = Vec::new();
    let mut line: Option<Vec<Point>> = None;

    for cmd in Commands::new(data) {
        match cmd? {
            Command::MoveTo(p) => {
                if let Some(done) = line.replace(vec![p]) {
                    lines.push(done);
                }
            }
            Command::LineTo(p) => match line.as_mut() {
                Some(l) => l.push(p),
                None => return Err(DecodeError::malformed("LineTo before MoveTo")),
            },
            Command::ClosePath => {
                if let Some(l) = line.as_mut()
                    && let Some(&first) = l.first()
                {
                    l.push(first);
                }
            }
        }
    }

    if let Some(l) = line {
        lines.push(l);
    }
    Ok(lines)
}

/// Bounding box of every MoveTo/LineTo position, or `None` for an empty stream.
pub fn bbox(data: &[u32]) -> Result<Option<BBox>, DecodeError> {
    let mut out: Option<BBox> = None;
    for cmd in Commands::new(data) {
        let p = match cmd? {
            Command::MoveTo(p) | Command::LineTo(p) => p,
            Command::ClosePath => continue,
        };
        match out.as_mut() {
            Some(b) => b.extend(p),
            None => out = Some(BBox::at(p)),
        }
    }
    Ok(out)
}

/// Twice the signed area of a ring (shoelace, y-down tile coordinates).
///
/// Accumulated in `i128`: a single term over full-range `i32` coordinates
/// already needs 66 bits.
pub fn signed_area(ring: &[Point]) -> i128 {
    let mut sum = 0i128;
    let mut j = ring.len().wrapping_sub(1);
    for (i, p1) in ring.iter().enumerate() {
        let p2 = ring[j];
        sum += (i128::from(p2.x) - i128::from(p1.x)) * (i128::from(p1.y) + i128::from(p2.y));
        j = i;
    }
    sum
}

/// Group polygon rings into polygons: each ring wound like the first
/// non-degenerate ring starts a new polygon, the others are its holes.
/// Zero-area rings are dropped.
pub fn classify_rings(rings: Vec<Vec<Point>>) -> Vec<Vec<Vec<Point>>> {
    if rings.len() <= 1 {
        return vec![rings];
    }

    let mut polygons = Vec::new();
    let mut polygon: Option<Vec<Vec<Point>>> = None;
    let mut outer_ccw: Option<bool> = None;

    for ring in rings {
        let area = signed_area(&ring);
        if area == 0 {
            continue;
        }
        let ccw = area < 0;
        let outer = *outer_ccw.get_or_insert(ccw);

        if ccw == outer {
            if let Some(done) = polygon.replace(vec![ring]) {
                polygons.push(done);
            }
        } else if let Some(p) = polygon.as_mut() {
            p.push(ring);
        }
    }
    if let Some(p) = polygon {
        polygons.push(p);
    }
    polygons
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
