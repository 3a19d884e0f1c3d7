use crate::grid::{Action, Position};

/// A single recorded transition within an episode
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TrajectoryStep {
    /// The agent's position before taking the action
    pub state: Position,
    /// The action taken
    pub action: Action,
    /// The position after the action, with wall moves clamped
    pub next_state: Position,
    /// The reward received for the transition
    pub reward: f32,
    /// Discounted return from this step to the end of the episode; 0.0 until
    /// the owning trajectory completes and returns are filled in
    pub ret: f32,
}

/// How a completed episode ended
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Outcome {
    /// Episode still in progress
    #[default]
    Incomplete,
    /// The agent reached the goal cell
    Goal,
    /// The agent stepped onto a trap cell
    Trap,
}

/// The ordered list of transitions taken during one episode
///
/// Exactly one trajectory is current at any time; once complete it is frozen
/// and archived into the session's history.
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    steps: Vec<TrajectoryStep>,
    complete: bool,
    outcome: Outcome,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[TrajectoryStep] {
        &self.steps
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Append a transition to the episode
    pub(crate) fn push(&mut self, step: TrajectoryStep) {
        self.steps.push(step);
    }

    /// Freeze the trajectory with its terminal outcome
    pub(crate) fn mark_complete(&mut self, outcome: Outcome) {
        self.complete = true;
        self.outcome = outcome;
    }

    /// Sum of all step rewards in the episode
    pub fn total_reward(&self) -> f32 {
        self.steps.iter().map(|step| step.reward).sum()
    }

    /// Fill in the discounted return of every step, walking backward with
    /// `G <- reward + gamma * G` seeded at 0
    ///
    /// After this, `steps[i].ret` equals the discounted sum of rewards from
    /// step `i` to the end of the episode. A no-op unless the trajectory is
    /// complete; returns are never computed for an episode still in progress.
    pub(crate) fn fill_returns(&mut self, gamma: f32) {
        if !self.complete {
            return;
        }
        let mut g = 0.0;
        for step in self.steps.iter_mut().rev() {
            g = step.reward + gamma * g;
            step.ret = g;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(reward: f32) -> TrajectoryStep {
        TrajectoryStep {
            state: Position::new(0, 0),
            action: Action::Right,
            next_state: Position::new(1, 0),
            reward,
            ret: 0.0,
        }
    }

    #[test]
    fn returns_accumulate_backward() {
        let mut trajectory = Trajectory::new();
        let (r0, r1, r2) = (-1.0f32, -1.0f32, 10.0f32);
        let g = 0.9f32;
        trajectory.push(step(r0));
        trajectory.push(step(r1));
        trajectory.push(step(r2));
        trajectory.mark_complete(Outcome::Goal);
        trajectory.fill_returns(g);

        let steps = trajectory.steps();
        assert_eq!(steps[2].ret, r2, "Last step's return is its own reward");
        assert_eq!(steps[1].ret, r1 + g * r2, "One step of discounting");
        assert_eq!(steps[0].ret, r0 + g * (r1 + g * r2), "Two steps of discounting");
    }

    #[test]
    fn returns_require_a_complete_trajectory() {
        let mut trajectory = Trajectory::new();
        trajectory.push(step(5.0));
        trajectory.fill_returns(0.9);
        assert_eq!(trajectory.steps()[0].ret, 0.0, "Incomplete trajectory is untouched");
        assert_eq!(trajectory.outcome(), Outcome::Incomplete);
    }

    #[test]
    fn total_reward_sums_all_steps() {
        let mut trajectory = Trajectory::new();
        trajectory.push(step(-1.0));
        trajectory.push(step(-1.0));
        trajectory.push(step(10.0));
        assert_eq!(trajectory.total_reward(), 8.0);
    }
}
