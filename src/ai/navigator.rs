//! Waypoint navigation
//!
//! Picks the next destination from a fixed list of points. There is no
//! path planning: agents travel in a straight line between waypoints.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Order in which waypoints are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Traversal {
    /// Uniformly random, never the current waypoint twice in a row
    #[default]
    Random,
    /// In list order, wrapping back to the first point
    Sequential,
}

/// Choose the waypoint after `current`.
///
/// Returns `None` for an empty list. A single-point list always yields that
/// point. In random mode the draw excludes `current` without resampling, so
/// it takes constant time.
pub fn choose_next<R: Rng>(
    current: usize,
    points: &[Vec3],
    mode: Traversal,
    rng: &mut R,
) -> Option<(usize, Vec3)> {
    let len = points.len();
    let next = match len {
        0 => return None,
        1 => 0,
        _ => match mode {
            Traversal::Random if current < len => {
                // Draw from the other len-1 indices and skip over current
                let pick = rng.gen_range(0..len - 1);
                if pick >= current { pick + 1 } else { pick }
            }
            Traversal::Random => rng.gen_range(0..len),
            Traversal::Sequential => (current + 1) % len,
        },
    };
    Some((next, points[next]))
}

/// Waypoint list with a cursor on the last chosen point
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    /// Points to travel between
    waypoints: Vec<Vec3>,
    /// Traversal order
    traversal: Traversal,
    /// Index of the last chosen waypoint
    cursor: usize,
}

impl Navigator {
    /// Create a navigator over `waypoints`
    #[must_use]
    pub fn new(waypoints: Vec<Vec3>, traversal: Traversal) -> Self {
        Self {
            waypoints,
            traversal,
            cursor: 0,
        }
    }

    /// Replace the waypoint list and reset the cursor
    pub fn set_waypoints(&mut self, waypoints: Vec<Vec3>) {
        self.waypoints = waypoints;
        self.cursor = 0;
    }

    /// Set the traversal order
    pub fn set_traversal(&mut self, traversal: Traversal) {
        self.traversal = traversal;
    }

    /// Advance the cursor and return the new destination.
    ///
    /// `None` if there are no waypoints.
    pub fn next_destination<R: Rng>(&mut self, rng: &mut R) -> Option<Vec3> {
        let (index, point) = choose_next(self.cursor, &self.waypoints, self.traversal, rng)?;
        self.cursor = index;
        Some(point)
    }

    /// Get the waypoints
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Get the traversal order
    #[must_use]
    pub const fn traversal(&self) -> Traversal {
        self.traversal
    }

    /// Index of the last chosen waypoint
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of waypoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Check if there is nowhere to go
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 10.0),
        ]
    }

    #[test]
    fn test_empty_list_has_no_destination() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(choose_next(0, &[], Traversal::Random, &mut rng), None);
        assert_eq!(choose_next(3, &[], Traversal::Sequential, &mut rng), None);
    }

    #[test]
    fn test_single_point_short_circuits() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let only = [Vec3::new(1.0, 2.0, 3.0)];

        for _ in 0..10 {
            assert_eq!(
                choose_next(0, &only, Traversal::Random, &mut rng),
                Some((0, only[0]))
            );
        }
        assert_eq!(
            choose_next(0, &only, Traversal::Sequential, &mut rng),
            Some((0, only[0]))
        );
    }

    #[test]
    fn test_random_never_repeats() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let points = square();
        let mut current = 0;

        for _ in 0..1000 {
            let (next, point) = choose_next(current, &points, Traversal::Random, &mut rng).unwrap();
            assert_ne!(next, current);
            assert_eq!(point, points[next]);
            current = next;
        }
    }

    #[test]
    fn test_random_two_points_alternate() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let points = [Vec3::ZERO, Vec3::X];

        assert_eq!(choose_next(0, &points, Traversal::Random, &mut rng).unwrap().0, 1);
        assert_eq!(choose_next(1, &points, Traversal::Random, &mut rng).unwrap().0, 0);
    }

    #[test]
    fn test_random_covers_all_other_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let points = square();
        let mut seen = [false; 4];

        for _ in 0..200 {
            let (next, _) = choose_next(2, &points, Traversal::Random, &mut rng).unwrap();
            seen[next] = true;
        }
        assert_eq!(seen, [true, true, false, true]);
    }

    #[test]
    fn test_random_out_of_range_cursor() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let points = square();
        let (next, _) = choose_next(17, &points, Traversal::Random, &mut rng).unwrap();
        assert!(next < points.len());
    }

    #[test]
    fn test_sequential_loops() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let points = square();
        let mut current = 0;
        let mut order = Vec::new();

        for _ in 0..5 {
            let (next, _) = choose_next(current, &points, Traversal::Sequential, &mut rng).unwrap();
            order.push(next);
            current = next;
        }
        assert_eq!(order, vec![1, 2, 3, 0, 1]);
    }

    #[test]
    fn test_navigator_cursor_follows_choice() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut nav = Navigator::new(square(), Traversal::Sequential);

        assert_eq!(nav.next_destination(&mut rng), Some(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(nav.cursor(), 1);

        nav.set_waypoints(vec![Vec3::ONE, Vec3::ZERO]);
        assert_eq!(nav.cursor(), 0);
        assert_eq!(nav.next_destination(&mut rng), Some(Vec3::ZERO));
    }

    #[test]
    fn test_navigator_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut nav = Navigator::default();

        assert!(nav.is_empty());
        assert_eq!(nav.next_destination(&mut rng), None);
        assert_eq!(nav.cursor(), 0);
    }
}
