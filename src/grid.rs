use rand::{seq::IteratorRandom, thread_rng, Rng};
use strum::{EnumIter, IntoEnumIterator, VariantArray};

/// A cell coordinate in the grid, with `(0, 0)` in the top-left corner
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// The four cardinal moves available to the agent
///
/// Discriminants are stable and double as array indices, and
/// [`VariantArray`] order is the tie-break order for greedy selection.
#[derive(EnumIter, VariantArray, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Action {
    /// Draw one of the four actions uniformly at random
    pub fn random() -> Self {
        Action::iter().choose(&mut thread_rng()).unwrap()
    }
}

/// Classification of a grid cell
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CellKind {
    #[default]
    Empty,
    Trap,
    Goal,
}

/// Reward constants emitted by [`GridWorld::step`]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rewards {
    pub step_penalty: f32,
    pub trap_penalty: f32,
    pub goal_reward: f32,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            step_penalty: -1.0,
            trap_penalty: -10.0,
            goal_reward: 10.0,
        }
    }
}

/// A rectangular grid with one goal cell and zero or more trap cells
///
/// The transition model is a pure function of the cell classifications, which
/// are fixed at construction. Agent position and episode state live in the
/// owning [session](crate::session::Session).
pub struct GridWorld {
    width: usize,
    height: usize,
    cells: Vec<CellKind>,
}

impl GridWorld {
    /// Build a `width` x `height` grid with the goal in the bottom-right corner
    /// and `traps` trap cells placed by rejection sampling
    ///
    /// Candidate cells are drawn uniformly; the start cell `(0, 0)`, the goal
    /// cell, and already-trapped cells are rejected and redrawn until `traps`
    /// distinct cells are placed. The trap count is not checked against the
    /// grid area here; callers must keep it at or below `width * height - 2`
    /// or placement never finishes.
    ///
    /// **Panics** if `width` or `height` is zero.
    pub fn new(width: usize, height: usize, traps: usize) -> Self {
        assert!(width >= 1 && height >= 1, "grid dimensions must be at least 1x1");

        let goal = (height - 1) * width + (width - 1);
        let mut cells = vec![CellKind::Empty; width * height];
        cells[goal] = CellKind::Goal;

        let mut rng = thread_rng();
        let mut placed = 0;
        while placed < traps {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            let i = y * width + x;
            if (x == 0 && y == 0) || i == goal || cells[i] == CellKind::Trap {
                continue;
            }
            cells[i] = CellKind::Trap;
            placed += 1;
        }

        Self { width, height, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Classification of the cell at `pos`
    pub fn kind_at(&self, pos: Position) -> CellKind {
        self.cells[pos.y * self.width + pos.x]
    }

    /// Number of trap cells in the grid
    pub fn trap_count(&self) -> usize {
        self.cells.iter().filter(|&&k| k == CellKind::Trap).count()
    }

    /// Apply one move from `from`, clamped to the grid bounds
    ///
    /// Moving into a wall leaves the position unchanged, a no-op
    /// displacement rather than an error.
    ///
    /// **Returns** `(next, reward, terminal)`: the reward is
    /// `rewards.step_penalty` for an empty destination, `trap_penalty` for a
    /// trap, or `goal_reward` for the goal; `terminal` is true iff the
    /// destination is a trap or the goal.
    pub fn step(&self, from: Position, action: Action, rewards: &Rewards) -> (Position, f32, bool) {
        let next = self.shifted(from, action);
        match self.kind_at(next) {
            CellKind::Empty => (next, rewards.step_penalty, false),
            CellKind::Trap => (next, rewards.trap_penalty, true),
            CellKind::Goal => (next, rewards.goal_reward, true),
        }
    }

    fn shifted(&self, pos: Position, action: Action) -> Position {
        match action {
            Action::Up => Position::new(pos.x, pos.y.saturating_sub(1)),
            Action::Right => Position::new((pos.x + 1).min(self.width - 1), pos.y),
            Action::Down => Position::new(pos.x, (pos.y + 1).min(self.height - 1)),
            Action::Left => Position::new(pos.x.saturating_sub(1), pos.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_in_bottom_right_corner() {
        let grid = GridWorld::new(5, 3, 0);
        assert_eq!(grid.kind_at(Position::new(4, 2)), CellKind::Goal, "Goal placed");
        assert_eq!(grid.trap_count(), 0, "No traps requested");
    }

    #[test]
    fn traps_distinct_and_never_on_start_or_goal() {
        // Maximum trap count forces every legal cell to be used, so any
        // collision with the start or goal cell would underflow the count.
        let grid = GridWorld::new(4, 4, 14);
        assert_eq!(grid.trap_count(), 14, "Exactly the requested trap count");
        assert_eq!(grid.kind_at(Position::new(0, 0)), CellKind::Empty, "Start never trapped");
        assert_eq!(grid.kind_at(Position::new(3, 3)), CellKind::Goal, "Goal never trapped");
    }

    #[test]
    fn moves_clamp_at_walls() {
        let grid = GridWorld::new(3, 3, 0);
        let rewards = Rewards::default();

        let (next, reward, terminal) = grid.step(Position::new(0, 0), Action::Up, &rewards);
        assert_eq!(next, Position::new(0, 0), "Up at the top edge is a no-op");
        assert_eq!(reward, -1.0, "Step penalty still applies");
        assert!(!terminal, "Clamped move is not terminal");

        let (next, ..) = grid.step(Position::new(0, 0), Action::Left, &rewards);
        assert_eq!(next, Position::new(0, 0), "Left at the left edge is a no-op");

        let (next, ..) = grid.step(Position::new(0, 2), Action::Down, &rewards);
        assert_eq!(next, Position::new(0, 2), "Down at the bottom edge is a no-op");

        let (next, ..) = grid.step(Position::new(2, 0), Action::Right, &rewards);
        assert_eq!(next, Position::new(2, 0), "Right at the right edge is a no-op");
    }

    #[test]
    fn reaching_the_goal_terminates() {
        let grid = GridWorld::new(2, 1, 0);
        let (next, reward, terminal) =
            grid.step(Position::new(0, 0), Action::Right, &Rewards::default());
        assert_eq!(next, Position::new(1, 0), "Agent moved onto the goal");
        assert_eq!(reward, 10.0, "Goal reward emitted");
        assert!(terminal, "Goal is terminal");
    }

    #[test]
    fn ordinary_steps_emit_the_step_penalty() {
        let grid = GridWorld::new(3, 1, 0);
        let (next, reward, terminal) =
            grid.step(Position::new(0, 0), Action::Right, &Rewards::default());
        assert_eq!(next, Position::new(1, 0));
        assert_eq!(reward, -1.0, "Step penalty emitted");
        assert!(!terminal, "Empty cell is not terminal");
    }
}
