//! World grid <-> screen pixel conversion.
//!
//! `camera` is the world-space pixel offset (at the current cell size) that
//! is subtracted from a cell's pixel position to place it on screen.

use crate::model::GridPoint;

/// Camera offset in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
}

impl Camera {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Screen position of a world cell.
pub fn world_to_screen(p: GridPoint, camera: Camera, cell_size: f32) -> (f32, f32) {
    (
        p.x as f32 * cell_size - camera.x,
        p.y as f32 * cell_size - camera.y,
    )
}

/// World cell containing a screen position. Used for grid-label placement.
pub fn screen_to_world_cell(sx: f32, sy: f32, camera: Camera, cell_size: f32) -> GridPoint {
    GridPoint::new(
        ((sx + camera.x) / cell_size).floor() as i32,
        ((sy + camera.y) / cell_size).floor() as i32,
    )
}

/// Every how many cells a coordinate label is drawn. Labels thin out as
/// cells shrink below 40 px.
pub fn label_interval(cell_size: f32) -> i32 {
    ((40.0 / cell_size).floor() as i32).max(1)
}

/// Screen coordinate of the first grid line at or before 0 on one axis.
pub fn first_grid_line(camera_axis: f32, cell_size: f32) -> f32 {
    (camera_axis / cell_size).floor() * cell_size - camera_axis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_to_screen_subtracts_camera() {
        let cam = Camera::new(100.0, -20.0);
        assert_eq!(
            world_to_screen(GridPoint::new(5, 3), cam, 40.0),
            (100.0, 140.0)
        );
    }

    #[test]
    fn screen_to_cell_round_trips_through_cell_centre() {
        let cameras = [
            Camera::new(0.0, 0.0),
            Camera::new(-333.5, 71.25),
            Camera::new(12_000.0, -9_876.0),
        ];
        for cam in cameras {
            for cell in [0.7_f32, 4.0, 40.0, 65.16] {
                for &(x, y) in &[(0, 0), (5, 3), (-7, 12), (250, -250)] {
                    let p = GridPoint::new(x, y);
                    let (sx, sy) = world_to_screen(p, cam, cell);
                    let back = screen_to_world_cell(sx + cell / 2.0, sy + cell / 2.0, cam, cell);
                    assert_eq!(back, p, "cell {cell} camera {cam:?}");
                }
            }
        }
    }

    #[test]
    fn negative_cells_floor_downwards() {
        let cam = Camera::default();
        assert_eq!(
            screen_to_world_cell(-0.5, -39.0, cam, 40.0),
            GridPoint::new(-1, -1)
        );
    }

    #[test]
    fn label_interval_thins_when_zoomed_out() {
        assert_eq!(label_interval(40.0), 1);
        assert_eq!(label_interval(100.0), 1);
        assert_eq!(label_interval(20.0), 2);
        assert_eq!(label_interval(4.0), 10);
        assert_eq!(label_interval(3.9), 10);
        assert_eq!(label_interval(0.5), 80);
    }

    #[test]
    fn first_grid_line_is_within_one_cell() {
        for cam in [-95.0_f32, -40.0, 0.0, 13.0, 79.9] {
            let start = first_grid_line(cam, 40.0);
            assert!(start <= 0.0 && start > -40.0, "cam {cam} -> {start}");
        }
    }
}
