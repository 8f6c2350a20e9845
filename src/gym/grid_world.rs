use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, FromRepr, IntoEnumIterator};

use crate::{Error, Result};

/// Grid coordinates as `(row, col)`, with `(0, 0)` in the top left corner
pub type Pos = (usize, usize);

/// The four cardinal moves, encoded `0..4` in this order
#[derive(EnumIter, FromRepr, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Action {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Action {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Row and column offsets of the move
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Right => (0, 1),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
        }
    }

    /// Target of the move from `pos`, or `None` if it would leave a `size`×`size` grid
    pub fn apply(self, pos: Pos, size: usize) -> Option<Pos> {
        let (dr, dc) = self.delta();
        let row = pos.0.checked_add_signed(dr)?;
        let col = pos.1.checked_add_signed(dc)?;
        (row < size && col < size).then_some((row, col))
    }
}

/// Contents of a single grid cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Empty,
    Obstacle,
    Reward,
    Penalty,
    Goal,
}

/// How many items to scatter over the grid on each reset
///
/// Items are never placed within `clearance` (Manhattan distance) of the start or the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub obstacles: usize,
    pub rewards: usize,
    pub penalties: usize,
    pub clearance: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            obstacles: 4,
            rewards: 10,
            penalties: 2,
            clearance: 3,
        }
    }
}

impl Layout {
    pub fn total(&self) -> usize {
        self.obstacles + self.rewards + self.penalties
    }
}

pub fn manhattan(a: Pos, b: Pos) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

/// A square grid with a fixed start in the top left corner and the goal in the bottom right
#[derive(Debug, Clone)]
pub struct GridWorld {
    size: usize,
    cells: Vec<Cell>,
    start: Pos,
    goal: Pos,
    visited: HashSet<Pos>,
}

impl GridWorld {
    /// An empty `size`×`size` grid holding only the goal
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 {
            return Err(Error::InvalidGridSize { size });
        }
        let mut world = Self {
            size,
            cells: vec![Cell::Empty; size * size],
            start: (0, 0),
            goal: (size - 1, size - 1),
            visited: HashSet::new(),
        };
        world.clear();
        Ok(world)
    }

    /// A grid populated according to `layout`
    pub fn generate<R: Rng + ?Sized>(size: usize, layout: &Layout, rng: &mut R) -> Result<Self> {
        let mut world = Self::new(size)?;
        world.reset(layout, rng)?;
        Ok(world)
    }

    /// Regenerate the grid, scattering the items of `layout` uniformly over the eligible cells
    ///
    /// Fails with [`Error::InfeasiblePlacement`] without touching the grid if there are fewer
    /// eligible cells than requested items.
    pub fn reset<R: Rng + ?Sized>(&mut self, layout: &Layout, rng: &mut R) -> Result<()> {
        let mut eligible = self.check_layout(layout)?;
        let requested = layout.total();

        self.clear();
        let (chosen, _) = eligible.partial_shuffle(rng, requested);
        let items = [
            (Cell::Obstacle, layout.obstacles),
            (Cell::Reward, layout.rewards),
            (Cell::Penalty, layout.penalties),
        ]
        .into_iter()
        .flat_map(|(cell, count)| std::iter::repeat(cell).take(count));
        for (&pos, cell) in chosen.iter().zip(items) {
            let i = self.index(pos);
            self.cells[i] = cell;
        }

        log::debug!(
            "Generated {0}x{0} grid: {1} obstacles, {2} rewards, {3} penalties",
            self.size,
            layout.obstacles,
            layout.rewards,
            layout.penalties
        );
        Ok(())
    }

    /// Fails with [`Error::InfeasiblePlacement`] if `layout` does not fit on this grid
    ///
    /// **Returns** the cells eligible for placement
    pub fn check_layout(&self, layout: &Layout) -> Result<Vec<Pos>> {
        let eligible = self.eligible_cells(layout.clearance);
        let requested = layout.total();
        if requested > eligible.len() {
            return Err(Error::InfeasiblePlacement {
                requested,
                available: eligible.len(),
            });
        }
        Ok(eligible)
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
        let goal = self.index(self.goal);
        self.cells[goal] = Cell::Goal;
        self.visited.clear();
        self.visited.insert(self.start);
    }

    /// Cells far enough from both the start and the goal to hold an item
    fn eligible_cells(&self, clearance: usize) -> Vec<Pos> {
        (0..self.size)
            .flat_map(|row| (0..self.size).map(move |col| (row, col)))
            .filter(|&pos| {
                pos != self.start
                    && pos != self.goal
                    && manhattan(pos, self.start) >= clearance
                    && manhattan(pos, self.goal) >= clearance
            })
            .collect()
    }

    fn index(&self, pos: Pos) -> usize {
        pos.0 * self.size + pos.1
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> Pos {
        self.start
    }

    pub fn goal(&self) -> Pos {
        self.goal
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.0 < self.size && pos.1 < self.size
    }

    /// Fails with [`Error::InvalidCoordinate`] if `pos` is outside the grid
    pub fn check(&self, pos: Pos) -> Result<()> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(Error::InvalidCoordinate {
                row: pos.0 as isize,
                col: pos.1 as isize,
            })
        }
    }

    /// Cell at `pos`, or `None` if out of range
    pub fn cell_at(&self, pos: Pos) -> Option<Cell> {
        self.contains(pos).then(|| self.cells[self.index(pos)])
    }

    /// Like [`cell_at`](Self::cell_at), but accepts negative probes
    pub fn cell_at_signed(&self, row: isize, col: isize) -> Option<Cell> {
        let pos = (usize::try_from(row).ok()?, usize::try_from(col).ok()?);
        self.cell_at(pos)
    }

    pub fn is_traversable(&self, pos: Pos) -> bool {
        self.cell_at(pos).is_some_and(|cell| cell != Cell::Obstacle)
    }

    /// Actions from `pos` that stay on the grid and avoid obstacles
    pub fn valid_actions(&self, pos: Pos) -> Vec<Action> {
        Action::iter()
            .filter(|a| {
                a.apply(pos, self.size)
                    .is_some_and(|target| self.is_traversable(target))
            })
            .collect()
    }

    /// Valid actions that reduce the distance to `goal` along their own axis
    ///
    /// May be empty, see [`preferred_actions`](Self::preferred_actions) for the variant with a fallback.
    pub fn goal_directed_actions(&self, pos: Pos, goal: Pos) -> Vec<Action> {
        self.valid_actions(pos)
            .into_iter()
            .filter(|a| match a {
                Action::Up => pos.0 > goal.0,
                Action::Right => pos.1 < goal.1,
                Action::Down => pos.0 < goal.0,
                Action::Left => pos.1 > goal.1,
            })
            .collect()
    }

    /// Goal-directed actions, or all valid actions when no move toward the goal is open
    pub fn preferred_actions(&self, pos: Pos, goal: Pos) -> Vec<Action> {
        let actions = self.goal_directed_actions(pos, goal);
        if actions.is_empty() {
            self.valid_actions(pos)
        } else {
            actions
        }
    }

    /// Overwrite a cell
    ///
    /// Fails with [`Error::FixedGoal`] when asked to overwrite the goal or place a second one.
    pub fn set_cell(&mut self, pos: Pos, cell: Cell) -> Result<()> {
        self.check(pos)?;
        if pos == self.goal || cell == Cell::Goal {
            return Err(Error::FixedGoal {
                row: self.goal.0,
                col: self.goal.1,
            });
        }
        let i = self.index(pos);
        self.cells[i] = cell;
        Ok(())
    }

    /// Reset a cell to [`Cell::Empty`], returning what it held
    pub fn clear_cell(&mut self, pos: Pos) -> Result<Cell> {
        self.check(pos)?;
        let i = self.index(pos);
        Ok(std::mem::take(&mut self.cells[i]))
    }

    pub fn visit(&mut self, pos: Pos) {
        self.visited.insert(pos);
    }

    pub fn is_visited(&self, pos: Pos) -> bool {
        self.visited.contains(&pos)
    }

    /// Iterate over the rows of the grid, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size)
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn seeded_world(seed: u64) -> GridWorld {
        let mut rng = StdRng::seed_from_u64(seed);
        GridWorld::generate(10, &Layout::default(), &mut rng).unwrap()
    }

    #[test]
    fn action_moves() {
        assert_eq!(Action::Up.apply((1, 1), 3), Some((0, 1)), "Up decreases row");
        assert_eq!(Action::Right.apply((1, 1), 3), Some((1, 2)), "Right increases column");
        assert_eq!(Action::Down.apply((1, 1), 3), Some((2, 1)), "Down increases row");
        assert_eq!(Action::Left.apply((1, 1), 3), Some((1, 0)), "Left decreases column");
        assert_eq!(Action::Up.apply((0, 0), 3), None, "Cannot leave through the top");
        assert_eq!(Action::Right.apply((2, 2), 3), None, "Cannot leave through the side");
        assert_eq!(Action::from_repr(2), Some(Action::Down), "Actions are encoded 0..4");
    }

    #[test]
    fn generation_respects_layout() {
        for seed in 0..20 {
            let world = seeded_world(seed);
            let layout = Layout::default();
            assert_eq!(world.count(Cell::Goal), 1, "Exactly one goal");
            assert_eq!(world.cell_at((9, 9)), Some(Cell::Goal), "Goal in the corner");
            assert_eq!(world.count(Cell::Obstacle), layout.obstacles);
            assert_eq!(world.count(Cell::Reward), layout.rewards);
            assert_eq!(world.count(Cell::Penalty), layout.penalties);
            assert_eq!(world.cell_at(world.start()), Some(Cell::Empty), "Start is clear");

            for (row, cells) in world.rows().enumerate() {
                for (col, cell) in cells.iter().enumerate() {
                    if matches!(cell, Cell::Obstacle | Cell::Reward | Cell::Penalty) {
                        assert!(manhattan((row, col), world.start()) >= 3, "Start area is clear");
                        assert!(manhattan((row, col), world.goal()) >= 3, "Goal area is clear");
                    }
                }
            }
        }
    }

    #[test]
    fn infeasible_placement_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut world = GridWorld::new(4).unwrap();
        let layout = Layout {
            obstacles: 10,
            ..Default::default()
        };
        let Err(Error::InfeasiblePlacement { requested, available }) =
            world.reset(&layout, &mut rng)
        else {
            panic!("Infeasible layout accepted");
        };
        assert_eq!(requested, 22);
        assert!(available < requested);
        assert_eq!(world.count(Cell::Obstacle), 0, "Grid left untouched");
    }

    #[test]
    fn grid_too_small() {
        assert!(matches!(GridWorld::new(1), Err(Error::InvalidGridSize { size: 1 })));
    }

    #[test]
    fn out_of_range_queries() {
        let world = GridWorld::new(5).unwrap();
        assert_eq!(world.cell_at((5, 0)), None);
        assert_eq!(world.cell_at_signed(-1, 0), None);
        assert_eq!(world.cell_at_signed(0, 4), Some(Cell::Empty));
        assert!(!world.is_traversable((0, 5)));
        assert!(world.check((7, 7)).is_err());
    }

    #[test]
    fn valid_actions_avoid_walls_and_obstacles() {
        for seed in 0..10 {
            let world = seeded_world(seed);
            for row in 0..world.size() {
                for col in 0..world.size() {
                    for action in world.valid_actions((row, col)) {
                        let target = action.apply((row, col), world.size());
                        assert!(target.is_some(), "Valid action stays on the grid");
                        assert!(
                            world.is_traversable(target.unwrap()),
                            "Valid action avoids obstacles"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn goal_directed_actions_reduce_distance() {
        for seed in 0..10 {
            let world = seeded_world(seed);
            let goal = world.goal();
            for row in 0..world.size() {
                for col in 0..world.size() {
                    let pos = (row, col);
                    for action in world.goal_directed_actions(pos, goal) {
                        let target = action.apply(pos, world.size()).unwrap();
                        assert!(manhattan(target, goal) < manhattan(pos, goal));
                    }
                }
            }
        }
    }

    #[test]
    fn preferred_actions_fall_back_when_boxed_in() {
        let mut world = GridWorld::new(4).unwrap();
        // Both moves toward the goal are blocked from (1, 1)
        world.set_cell((2, 1), Cell::Obstacle).unwrap();
        world.set_cell((1, 2), Cell::Obstacle).unwrap();

        assert!(world.goal_directed_actions((1, 1), world.goal()).is_empty());
        assert_eq!(
            world.preferred_actions((1, 1), world.goal()),
            vec![Action::Up, Action::Left]
        );
        assert_eq!(
            world.preferred_actions((0, 0), world.goal()),
            vec![Action::Right, Action::Down]
        );
    }

    #[test]
    fn goal_cannot_be_overwritten() {
        let mut world = GridWorld::new(3).unwrap();
        assert!(matches!(
            world.set_cell((2, 2), Cell::Obstacle),
            Err(Error::FixedGoal { row: 2, col: 2 })
        ));
        assert!(
            matches!(world.set_cell((0, 1), Cell::Goal), Err(Error::FixedGoal { .. })),
            "No second goal"
        );
        assert_eq!(world.cell_at((2, 2)), Some(Cell::Goal));
        assert_eq!(world.cell_at((0, 1)), Some(Cell::Empty));
        assert_eq!(world.count(Cell::Goal), 1);
        world.set_cell((0, 1), Cell::Reward).unwrap();
        assert_eq!(world.cell_at((0, 1)), Some(Cell::Reward));
    }

    #[test]
    fn reset_clears_visited() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = GridWorld::new(6).unwrap();
        world.visit((2, 3));
        assert!(world.is_visited((2, 3)));
        world
            .reset(
                &Layout {
                    obstacles: 1,
                    rewards: 1,
                    penalties: 1,
                    clearance: 3,
                },
                &mut rng,
            )
            .unwrap();
        assert!(!world.is_visited((2, 3)), "Visited set is episode scoped");
        assert!(world.is_visited(world.start()), "Start counts as visited");
    }
}
