//! Integer ray traversal over grid cells.
//!
//! Bresenham's algorithm enumerates each cell along a ray exactly once,
//! so free-space updates never double-visit a cell within one traversal.

use super::limits::CellIndex;

/// Iterator over the cells of a ray, endpoints included.
#[derive(Debug, Clone)]
pub struct RayCells {
    x: i32,
    y: i32,
    end_x: i32,
    end_y: i32,
    dx: i32,
    dy: i32,
    step_x: i32,
    step_y: i32,
    err: i32,
    finished: bool,
}

/// Enumerate the cells from `begin` to `end`, both inclusive.
pub fn ray_cells(begin: CellIndex, end: CellIndex) -> RayCells {
    let dx = (end.x - begin.x).abs();
    let dy = (end.y - begin.y).abs();
    RayCells {
        x: begin.x,
        y: begin.y,
        end_x: end.x,
        end_y: end.y,
        dx,
        dy,
        step_x: if begin.x < end.x { 1 } else { -1 },
        step_y: if begin.y < end.y { 1 } else { -1 },
        err: dx - dy,
        finished: false,
    }
}

impl Iterator for RayCells {
    type Item = CellIndex;

    fn next(&mut self) -> Option<CellIndex> {
        if self.finished {
            return None;
        }

        let current = CellIndex::new(self.x, self.y);
        if self.x == self.end_x && self.y == self.end_y {
            self.finished = true;
            return Some(current);
        }

        let e2 = 2 * self.err;
        if e2 > -self.dy {
            self.err -= self.dy;
            self.x += self.step_x;
        }
        if e2 < self.dx {
            self.err += self.dx;
            self.y += self.step_y;
        }

        Some(current)
    }
}
