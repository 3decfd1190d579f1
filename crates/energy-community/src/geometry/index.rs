use super::{BoundingBox, Point};

/// Upper bound on grid cells per axis; keeps memory flat for national tract layers.
const MAX_CELLS_PER_AXIS: usize = 1024;

/// A cell listing more entries than this is refined with a nested grid.
const SPLIT_THRESHOLD: usize = 32;

/// Nesting limit, counting the top-level grid.
const MAX_DEPTH: usize = 2;

#[derive(Debug, Clone)]
enum Cell {
    Leaf(Vec<u32>),
    Split(Box<GridIndex>),
}

/// Grid over the extent of a layer, refined where entries cluster.
///
/// Each cell lists every entry whose bounding box touches it, so a lookup only has to run
/// the exact containment test on a handful of candidates. The top-level grid spans the
/// whole layer, which for a national layer is mostly ocean and Alaska; a cell that still
/// holds a dense metro after that gets its own grid over the cell's bounds. The grid is
/// immutable; a new layer load builds a new one.
#[derive(Debug, Clone)]
pub(crate) struct GridIndex {
    extent: BoundingBox,
    cols: usize,
    rows: usize,
    cell_width: f64,
    cell_height: f64,
    cells: Vec<Cell>,
}

impl GridIndex {
    /// Builds a grid sized to roughly one entry per cell.
    pub(crate) fn build(boxes: &[BoundingBox]) -> Self {
        let Some(extent) = boxes.iter().copied().reduce(|acc, next| acc.union(&next)) else {
            return Self::empty();
        };
        let slots: Vec<u32> = (0..boxes.len() as u32).collect();
        Self::build_within(extent, boxes, &slots, 1)
    }

    fn build_within(
        extent: BoundingBox,
        boxes: &[BoundingBox],
        slots: &[u32],
        depth: usize,
    ) -> Self {
        let target = slots.len().max(1) as f64;
        let width = extent.width().max(f64::EPSILON);
        let height = extent.height().max(f64::EPSILON);
        let aspect = width / height;
        let cols = ((target * aspect).sqrt().ceil() as usize).clamp(1, MAX_CELLS_PER_AXIS);
        let rows = ((target / aspect).sqrt().ceil() as usize).clamp(1, MAX_CELLS_PER_AXIS);

        let mut index = Self {
            extent,
            cols,
            rows,
            cell_width: width / cols as f64,
            cell_height: height / rows as f64,
            cells: Vec::new(),
        };

        let mut buckets = vec![Vec::new(); cols * rows];
        for &slot in slots {
            let bbox = &boxes[slot as usize];
            let (min_col, min_row) = index.cell_coords(bbox.min_lng, bbox.min_lat);
            let (max_col, max_row) = index.cell_coords(bbox.max_lng, bbox.max_lat);
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    buckets[row * cols + col].push(slot);
                }
            }
        }

        let cells = buckets
            .into_iter()
            .enumerate()
            .map(|(cell, bucket)| index.refine(cell, bucket, boxes, depth))
            .collect();
        index.cells = cells;
        index
    }

    /// Keeps a nested grid only when it actually shrinks the worst candidate list.
    fn refine(&self, cell: usize, bucket: Vec<u32>, boxes: &[BoundingBox], depth: usize) -> Cell {
        if bucket.len() <= SPLIT_THRESHOLD || depth >= MAX_DEPTH {
            return Cell::Leaf(bucket);
        }
        let extent = self.nested_extent(cell, &bucket, boxes);
        let nested = Self::build_within(extent, boxes, &bucket, depth + 1);
        if nested.largest_cell() < bucket.len() {
            Cell::Split(Box::new(nested))
        } else {
            Cell::Leaf(bucket)
        }
    }

    /// The cell's bounds shrunk to the entries it holds.
    fn nested_extent(&self, cell: usize, bucket: &[u32], boxes: &[BoundingBox]) -> BoundingBox {
        let (col, row) = (cell % self.cols, cell / self.cols);
        let min_lng = self.extent.min_lng + col as f64 * self.cell_width;
        let min_lat = self.extent.min_lat + row as f64 * self.cell_height;
        let bounds = BoundingBox {
            min_lng,
            min_lat,
            max_lng: min_lng + self.cell_width,
            max_lat: min_lat + self.cell_height,
        };
        let Some(occupied) = bucket
            .iter()
            .map(|slot| boxes[*slot as usize])
            .reduce(|acc, next| acc.union(&next))
        else {
            return bounds;
        };
        let clipped = BoundingBox {
            min_lng: occupied.min_lng.max(bounds.min_lng),
            min_lat: occupied.min_lat.max(bounds.min_lat),
            max_lng: occupied.max_lng.min(bounds.max_lng),
            max_lat: occupied.max_lat.min(bounds.max_lat),
        };
        if clipped.min_lng <= clipped.max_lng && clipped.min_lat <= clipped.max_lat {
            clipped
        } else {
            bounds
        }
    }

    fn empty() -> Self {
        Self {
            extent: BoundingBox {
                min_lng: 0.0,
                min_lat: 0.0,
                max_lng: 0.0,
                max_lat: 0.0,
            },
            cols: 0,
            rows: 0,
            cell_width: 0.0,
            cell_height: 0.0,
            cells: Vec::new(),
        }
    }

    fn cell_coords(&self, lng: f64, lat: f64) -> (usize, usize) {
        let col = ((lng - self.extent.min_lng) / self.cell_width).floor();
        let row = ((lat - self.extent.min_lat) / self.cell_height).floor();
        let col = (col.max(0.0) as usize).min(self.cols - 1);
        let row = (row.max(0.0) as usize).min(self.rows - 1);
        (col, row)
    }

    /// Slots whose bounding boxes may contain `point`.
    pub(crate) fn candidates(&self, point: Point) -> &[u32] {
        if self.cells.is_empty() || !self.extent.contains(point) {
            return &[];
        }
        self.lookup(point)
    }

    // Nested grids clamp rather than reject; a point and every box holding it pass through
    // the same monotone cell function.
    fn lookup(&self, point: Point) -> &[u32] {
        let (col, row) = self.cell_coords(point.lng, point.lat);
        match &self.cells[row * self.cols + col] {
            Cell::Leaf(slots) => slots,
            Cell::Split(nested) => nested.lookup(point),
        }
    }

    fn largest_cell(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| match cell {
                Cell::Leaf(slots) => slots.len(),
                Cell::Split(nested) => nested.largest_cell(),
            })
            .max()
            .unwrap_or(0)
    }

    /// Top-level columns and rows.
    pub(crate) fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Top-level cells refined with a nested grid.
    pub(crate) fn split_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, Cell::Split(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> BoundingBox {
        BoundingBox {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    #[test]
    fn empty_index_has_no_candidates() {
        let index = GridIndex::build(&[]);
        assert!(index.candidates(Point { lng: 0.0, lat: 0.0 }).is_empty());
        assert_eq!(index.dimensions(), (0, 0));
    }

    #[test]
    fn candidates_cover_boxes_touching_the_cell() {
        let boxes: Vec<BoundingBox> = (0..16)
            .map(|i| {
                let x = (i % 4) as f64;
                let y = (i / 4) as f64;
                bbox(x, y, x + 1.0, y + 1.0)
            })
            .collect();
        let index = GridIndex::build(&boxes);
        assert_eq!(index.dimensions(), (4, 4));

        let hits = index.candidates(Point { lng: 2.5, lat: 1.5 });
        assert!(hits.contains(&6));
        assert!(!hits.contains(&0));

        // A point on a cell border must still see the box whose edge sits on that border.
        let border = index.candidates(Point { lng: 2.0, lat: 1.5 });
        assert!(border.contains(&5));
        assert!(border.contains(&6));
    }

    #[test]
    fn points_outside_extent_are_skipped() {
        let index = GridIndex::build(&[bbox(0.0, 0.0, 1.0, 1.0)]);
        assert!(index.candidates(Point { lng: 1.5, lat: 0.5 }).is_empty());
        assert_eq!(index.candidates(Point { lng: 1.0, lat: 1.0 }), &[0]);
    }

    #[test]
    fn large_box_spans_many_cells() {
        let mut boxes: Vec<BoundingBox> = (0..99)
            .map(|i| {
                let x = (i % 10) as f64;
                let y = (i / 10) as f64;
                bbox(x, y, x + 0.5, y + 0.5)
            })
            .collect();
        boxes.push(bbox(0.0, 0.0, 10.0, 10.0));
        let index = GridIndex::build(&boxes);

        for point in [
            Point { lng: 0.1, lat: 0.1 },
            Point { lng: 9.9, lat: 9.9 },
            Point { lng: 5.0, lat: 5.0 },
        ] {
            assert!(index.candidates(point).contains(&99));
        }
    }

    #[test]
    fn dense_cluster_gets_a_nested_grid() {
        // One remote box stretches the extent so the cluster lands in a single top cell.
        let mut boxes = vec![bbox(-170.0, 50.0, -169.0, 51.0)];
        for i in 0..400 {
            let x = -81.0 + (i % 20) as f64 * 0.01;
            let y = 38.0 + (i / 20) as f64 * 0.01;
            boxes.push(bbox(x, y, x + 0.01, y + 0.01));
        }
        let index = GridIndex::build(&boxes);
        assert!(index.split_cells() >= 1);

        for (slot, bbox) in boxes.iter().enumerate().skip(1) {
            let center = Point {
                lng: (bbox.min_lng + bbox.max_lng) / 2.0,
                lat: (bbox.min_lat + bbox.max_lat) / 2.0,
            };
            let hits = index.candidates(center);
            assert!(hits.contains(&(slot as u32)), "slot {slot} missing");
            assert!(hits.len() <= 16, "{} candidates for slot {slot}", hits.len());
        }
        assert!(index
            .candidates(Point { lng: -169.5, lat: 50.5 })
            .contains(&0));
    }

    #[test]
    fn boxes_spanning_a_whole_cell_stay_a_leaf() {
        // Identical boxes cannot be separated, so nesting would only cost memory.
        let boxes = vec![bbox(0.0, 0.0, 1.0, 1.0); 40];
        let index = GridIndex::build(&boxes);
        assert_eq!(index.split_cells(), 0);
        assert_eq!(index.candidates(Point { lng: 0.5, lat: 0.5 }).len(), 40);
    }
}
