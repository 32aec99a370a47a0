use crate::math::{Polygon, Rect};
use crate::util::Interval;
use crate::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The most cells a tiled area may be divided into.
const MAX_CELLS: usize = 1 << 22;

/// Unique ID of a [Tile] within its [TiledArea].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileId(pub u32);

/// A cell of a [TiledArea].
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    id: TileId,
    rect: Rect,
    is_edge: bool,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    /// The region covered by the tile.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Whether the tile touches the boundary of the area.
    pub fn is_edge(&self) -> bool {
        self.is_edge
    }
}

/// A connection's area divided into a grid of tiles.
///
/// Only grid cells which overlap the area become tiles. Tile IDs are assigned
/// in row-major order starting from the minimum corner.
#[derive(Clone, Debug)]
pub struct TiledArea {
    area: Polygon,
    bounds: Rect,
    cols: usize,
    rows: usize,
    tile_width: f64,
    tile_height: f64,
    /// The tile in each grid cell, row-major.
    cells: Vec<Option<TileId>>,
    tiles: Vec<Tile>,
}

impl TiledArea {
    /// Divides `area` into tiles no larger than `granularity` along either side.
    pub fn new(area: &Polygon, granularity: f64) -> Result<Self> {
        if !(granularity.is_finite() && granularity > 0.0) {
            return Err(Error::DegenerateGeometry(format!(
                "tile granularity must be positive, got {granularity}"
            )));
        }
        let bounds = area.bounds();
        if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
            return Err(Error::DegenerateGeometry("area has no extent".into()));
        }

        let cols = (bounds.width() / granularity).ceil().max(1.0);
        let rows = (bounds.height() / granularity).ceil().max(1.0);
        if cols * rows > MAX_CELLS as f64 {
            return Err(Error::DegenerateGeometry(format!(
                "granularity {granularity} would produce {} tiles",
                cols * rows
            )));
        }
        let (cols, rows) = (cols as usize, rows as usize);
        let tile_width = bounds.width() / cols as f64;
        let tile_height = bounds.height() / rows as f64;

        let mut cells = Vec::with_capacity(cols * rows);
        let mut tiles = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let rect = Rect::new(
                    Interval::new(
                        bounds.x.min + col as f64 * tile_width,
                        bounds.x.min + (col + 1) as f64 * tile_width,
                    ),
                    Interval::new(
                        bounds.y.min + row as f64 * tile_height,
                        bounds.y.min + (row + 1) as f64 * tile_height,
                    ),
                );
                if area.intersects_rect(&rect) {
                    let id = TileId(tiles.len() as u32);
                    tiles.push(Tile {
                        id,
                        rect,
                        is_edge: !area.contains_rect(&rect),
                    });
                    cells.push(Some(id));
                } else {
                    cells.push(None);
                }
            }
        }

        log::debug!(
            "tiled area into {} tiles ({} edge) on a {}x{} grid",
            tiles.len(),
            tiles.iter().filter(|t| t.is_edge).count(),
            cols,
            rows
        );

        Ok(Self {
            area: area.clone(),
            bounds,
            cols,
            rows,
            tile_width,
            tile_height,
            cells,
            tiles,
        })
    }

    /// The area that was tiled.
    pub fn area(&self) -> &Polygon {
        &self.area
    }

    /// The number of columns and rows of the grid.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.0 as usize)
    }

    /// Gets the tile at a grid cell.
    pub fn tile_at(&self, col: usize, row: usize) -> Option<&Tile> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells[row * self.cols + col].and_then(|id| self.tile(id))
    }

    /// Finds every tile which overlaps or touches `shape`, in ID order.
    pub fn find_occupied_tiles(&self, shape: &Polygon) -> SmallVec<[&Tile; 16]> {
        let mut found = SmallVec::new();
        let shape_bounds = shape.bounds();
        if !shape_bounds.touches(&self.bounds) {
            return found;
        }
        let cols = Self::cell_range(shape_bounds.x, self.bounds.x, self.tile_width, self.cols);
        let rows = Self::cell_range(shape_bounds.y, self.bounds.y, self.tile_height, self.rows);
        for row in rows.min..=rows.max {
            for col in cols.min..=cols.max {
                if let Some(tile) = self.tile_at(col, row) {
                    if shape.intersects_rect(&tile.rect) {
                        found.push(tile);
                    }
                }
            }
        }
        found
    }

    /// The range of cells along one axis covered by `span`.
    fn cell_range(span: Interval<f64>, axis: Interval<f64>, size: f64, count: usize) -> Interval<usize> {
        let cell = |v: f64| {
            let idx = ((v - axis.min) / size).floor();
            idx.clamp(0.0, (count - 1) as f64) as usize
        };
        // A shape ending exactly on a cell boundary also touches the cell before it
        let min = cell(span.min);
        let min = if min > 0 && span.min <= axis.min + min as f64 * size { min - 1 } else { min };
        Interval::new(min, cell(span.max))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::{Point2d, Vector2d};

    fn rect_area(w: f64, h: f64) -> Polygon {
        Polygon::from_rect(Rect::new(Interval::new(0.0, w), Interval::new(0.0, h)))
    }

    #[test]
    fn only_centre_of_3x3_is_internal() {
        let tiled = TiledArea::new(&rect_area(3.0, 3.0), 1.0).unwrap();
        assert_eq!(tiled.dimensions(), (3, 3));
        assert_eq!(tiled.tiles().len(), 9);
        let internal: Vec<_> = tiled.tiles().iter().filter(|t| !t.is_edge()).map(|t| t.id()).collect();
        assert_eq!(internal, vec![TileId(4)]);
    }

    #[test]
    fn strip_of_three() {
        let tiled = TiledArea::new(&rect_area(30.0, 4.0), 10.0).unwrap();
        assert_eq!(tiled.dimensions(), (3, 1));
        assert!(tiled.tiles().iter().all(|t| t.is_edge()));
    }

    #[test]
    fn triangle_drops_empty_cells() {
        let tri = Polygon::new([
            Point2d::new(0.0, 0.0),
            Point2d::new(4.0, 0.0),
            Point2d::new(0.0, 4.0),
        ])
        .unwrap();
        let tiled = TiledArea::new(&tri, 1.0).unwrap();
        // Cells strictly above the hypotenuse are dropped; those it touches at a corner stay.
        assert!(tiled.tiles().len() < 16);
        assert!(tiled.tile_at(3, 3).is_none());
        assert!(tiled.tile_at(0, 0).is_some());
        assert!(tiled.tile_at(0, 0).unwrap().is_edge());
    }

    #[test]
    fn occupied_tiles() {
        let tiled = TiledArea::new(&rect_area(3.0, 3.0), 1.0).unwrap();
        let car = Polygon::oriented_rect(Point2d::new(1.5, 1.5), Vector2d::new(1.0, 0.0), 0.4, 0.2);
        let ids: Vec<_> = tiled.find_occupied_tiles(&car).iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![TileId(4)]);

        let car = Polygon::oriented_rect(Point2d::new(1.5, 1.5), Vector2d::new(1.0, 0.0), 1.2, 0.2);
        let ids: Vec<_> = tiled.find_occupied_tiles(&car).iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![TileId(3), TileId(4), TileId(5)]);

        let outside = Polygon::oriented_rect(Point2d::new(10.0, 1.5), Vector2d::new(1.0, 0.0), 1.0, 1.0);
        assert!(tiled.find_occupied_tiles(&outside).is_empty());
    }

    #[test]
    fn rejects_bad_granularity() {
        assert!(TiledArea::new(&rect_area(3.0, 3.0), 0.0).is_err());
        assert!(TiledArea::new(&rect_area(3.0, 3.0), f64::NAN).is_err());
        assert!(TiledArea::new(&rect_area(1e6, 1e6), 0.01).is_err());
    }
}
