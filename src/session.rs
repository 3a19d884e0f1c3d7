use std::time::Duration;

use log::{debug, info};

use crate::{
    assert_interval,
    error::ValidationError,
    exploration::{Choice, EpsilonGreedy},
    grid::{Action, CellKind, GridWorld, Position, Rewards},
    metrics::RewardHistory,
    q_table::QTable,
    trajectory::{Outcome, Trajectory, TrajectoryStep},
};

/// Smallest allowed grid dimension
pub const MIN_DIMENSION: usize = 1;
/// Largest allowed grid dimension
pub const MAX_DIMENSION: usize = 20;
/// Shortest allowed tick cadence in milliseconds
pub const MIN_ACTION_DELAY_MS: u64 = 1;
/// Longest allowed tick cadence in milliseconds
pub const MAX_ACTION_DELAY_MS: u64 = 5000;

/// Largest legal trap count for a grid of the given dimensions
pub fn max_traps(width: usize, height: usize) -> usize {
    (width * height).saturating_sub(2)
}

/// Configuration for a [`Session`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub width: usize,
    pub height: usize,
    pub traps: usize,
    pub rewards: Rewards,
    /// Discount factor applied to future rewards
    pub gamma: f32,
    /// Step size of the Monte Carlo update; fixed for the life of the session
    pub learning_rate: f32,
    pub epsilon: f32,
    pub epsilon_decay: f32,
    pub max_episodes: u32,
    pub action_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 5,
            height: 3,
            traps: 3,
            rewards: Rewards::default(),
            gamma: 0.9,
            learning_rate: 0.1,
            epsilon: 0.9,
            epsilon_decay: 0.995,
            max_episodes: 1000,
            action_delay_ms: 10,
        }
    }
}

/// One simulation run: the grid, the agent, the learned action values, and
/// every counter the presentation layer reads
///
/// All mutation happens through `&mut self`, so a session shared behind a
/// mutex is serialized by construction: scheduler ticks and manual commands
/// cannot interleave. Construct one session per simulation; there is no
/// process-wide state.
///
/// The Q-table and trajectory history are owned exclusively by the session
/// and exposed through read accessors only.
pub struct Session {
    grid: GridWorld,
    traps: usize,
    agent: Position,
    rewards: Rewards,
    gamma: f32,
    learning_rate: f32,
    policy: EpsilonGreedy,
    q: QTable,
    current: Trajectory,
    history: Vec<Trajectory>,
    metrics: RewardHistory,
    episodes: u32,
    max_episodes: u32,
    action_delay: Duration,
    auto_running: bool,
}

impl Session {
    /// Initialize a session from a configuration
    ///
    /// **Panics** if any configured value is outside its legal interval; see
    /// the setters for the ranges. Use the setters for values arriving from
    /// unvalidated external sources.
    pub fn new(config: SessionConfig) -> Self {
        assert_interval!(config.width, MIN_DIMENSION, MAX_DIMENSION);
        assert_interval!(config.height, MIN_DIMENSION, MAX_DIMENSION);
        assert!(
            config.traps <= max_traps(config.width, config.height),
            "trap count must leave the start and goal cells free"
        );
        assert_interval!(config.gamma, 0.0, 1.0);
        assert_interval!(config.learning_rate, 0.0, 1.0);
        assert_interval!(config.action_delay_ms, MIN_ACTION_DELAY_MS, MAX_ACTION_DELAY_MS);
        assert!(config.max_episodes >= 1, "max episodes must be at least 1");

        Self {
            grid: GridWorld::new(config.width, config.height, config.traps),
            traps: config.traps,
            agent: Position::default(),
            rewards: config.rewards,
            gamma: config.gamma,
            learning_rate: config.learning_rate,
            policy: EpsilonGreedy::new(config.epsilon, config.epsilon_decay),
            q: QTable::new(),
            current: Trajectory::new(),
            history: Vec::new(),
            metrics: RewardHistory::new(),
            episodes: 0,
            max_episodes: config.max_episodes,
            action_delay: Duration::from_millis(config.action_delay_ms),
            auto_running: false,
        }
    }

    pub fn grid(&self) -> &GridWorld {
        &self.grid
    }

    pub fn agent_position(&self) -> Position {
        self.agent
    }

    /// Whether the current episode has reached a terminal cell
    pub fn is_terminal(&self) -> bool {
        self.current.is_complete()
    }

    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    pub fn current_trajectory(&self) -> &Trajectory {
        &self.current
    }

    /// Completed trajectories, oldest first
    pub fn trajectory_history(&self) -> &[Trajectory] {
        &self.history
    }

    pub fn metrics(&self) -> &RewardHistory {
        &self.metrics
    }

    /// Episodes completed under autonomous training
    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    pub fn max_episodes(&self) -> u32 {
        self.max_episodes
    }

    pub fn epsilon(&self) -> f32 {
        self.policy.epsilon()
    }

    pub fn epsilon_decay(&self) -> f32 {
        self.policy.decay()
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn rewards(&self) -> Rewards {
        self.rewards
    }

    pub fn action_delay(&self) -> Duration {
        self.action_delay
    }

    pub fn is_auto_running(&self) -> bool {
        self.auto_running
    }

    /// Estimates for all four actions at `state`
    pub fn action_values(&self, state: Position) -> [f32; 4] {
        self.q.action_values(state)
    }

    /// The greedy action at `state` under the current Q-table
    pub fn best_action(&self, state: Position) -> Action {
        self.q.best_action(state)
    }

    /// Replace the grid wholesale with new dimensions and trap count
    ///
    /// Returns the agent to the origin and discards the in-progress
    /// trajectory. The Q-table, trajectory history, metrics, and episode
    /// count are retained, so learned values survive topology changes as a
    /// warm start. Use [`reset`](Self::reset) for a cold start.
    pub fn reinitialize_grid(
        &mut self,
        width: usize,
        height: usize,
        traps: usize,
    ) -> Result<(), ValidationError> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&width) {
            return Err(ValidationError::Width(width));
        }
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&height) {
            return Err(ValidationError::Height(height));
        }
        let max = max_traps(width, height);
        if traps > max {
            return Err(ValidationError::TrapCount { requested: traps, max });
        }

        self.grid = GridWorld::new(width, height, traps);
        self.traps = traps;
        self.agent = Position::default();
        self.current = Trajectory::new();
        Ok(())
    }

    /// Cold start: rebuild the grid from the current parameters and clear all
    /// learned state (Q-table, trajectory history, metrics, episode count)
    ///
    /// Hyperparameters, reward constants, and the current epsilon are kept;
    /// they are configuration, not learned state.
    pub fn reset(&mut self) {
        self.grid = GridWorld::new(self.grid.width(), self.grid.height(), self.traps);
        self.agent = Position::default();
        self.current = Trajectory::new();
        self.q = QTable::new();
        self.history.clear();
        self.metrics = RewardHistory::new();
        self.episodes = 0;
    }

    /// Return the agent to the origin and begin a fresh trajectory
    pub fn new_episode(&mut self) {
        self.agent = Position::default();
        self.current = Trajectory::new();
    }

    /// Choose an action for `state` under the epsilon greedy policy
    pub fn select_action(&self, state: Position) -> Action {
        match self.policy.choose() {
            Choice::Explore => Action::random(),
            Choice::Exploit => self.q.best_action(state),
        }
    }

    /// Apply one move to the agent and record it in the current trajectory
    ///
    /// Ignored when the episode is already terminal. A move onto a trap or
    /// the goal completes the episode: returns are computed, the Q-table is
    /// updated, and the trajectory is archived before this call returns.
    pub fn move_agent(&mut self, action: Action) {
        if self.current.is_complete() {
            debug!("move ignored, episode already terminal");
            return;
        }

        let state = self.agent;
        let (next, reward, terminal) = self.grid.step(state, action, &self.rewards);
        self.current.push(TrajectoryStep {
            state,
            action,
            next_state: next,
            reward,
            ret: 0.0,
        });
        self.agent = next;

        if terminal {
            let outcome = match self.grid.kind_at(next) {
                CellKind::Goal => Outcome::Goal,
                _ => Outcome::Trap,
            };
            self.current.mark_complete(outcome);
            self.finalize_episode();
        }
    }

    /// Run one unit of autonomous training work
    ///
    /// Crosses an episode boundary only at a tick: a tick either starts a
    /// fresh episode (when the previous one is complete) or applies a single
    /// policy-selected step, never both.
    ///
    /// **Returns** whether autonomous training should keep running.
    pub fn training_tick(&mut self) -> bool {
        if self.episodes >= self.max_episodes {
            self.auto_running = false;
            return false;
        }

        if self.current.is_complete() {
            self.new_episode();
        } else {
            let action = self.select_action(self.agent);
            self.move_agent(action);
        }

        self.auto_running
    }

    pub(crate) fn set_auto_running(&mut self, running: bool) {
        self.auto_running = running;
    }

    /// Set the grid width; rebuilds the grid on success
    pub fn set_width(&mut self, width: usize) -> Result<(), ValidationError> {
        self.reinitialize_grid(width, self.grid.height(), self.traps)
    }

    /// Set the grid height; rebuilds the grid on success
    pub fn set_height(&mut self, height: usize) -> Result<(), ValidationError> {
        self.reinitialize_grid(self.grid.width(), height, self.traps)
    }

    /// Set the trap count; rebuilds the grid on success
    pub fn set_traps(&mut self, traps: usize) -> Result<(), ValidationError> {
        self.reinitialize_grid(self.grid.width(), self.grid.height(), traps)
    }

    /// Set the discount factor, in `[0, 1]`
    pub fn set_gamma(&mut self, gamma: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&gamma) {
            return Err(ValidationError::Gamma(gamma));
        }
        self.gamma = gamma;
        Ok(())
    }

    /// Set the exploration probability, in `[0, 1]`
    pub fn set_epsilon(&mut self, epsilon: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(ValidationError::Epsilon(epsilon));
        }
        self.policy.set_epsilon(epsilon);
        Ok(())
    }

    /// Set the per-episode epsilon decay multiplier, in `[0.9, 1]`
    pub fn set_epsilon_decay(&mut self, decay: f32) -> Result<(), ValidationError> {
        if !(0.9..=1.0).contains(&decay) {
            return Err(ValidationError::EpsilonDecay(decay));
        }
        self.policy.set_decay(decay);
        Ok(())
    }

    /// Set the tick cadence in milliseconds, in `[1, 5000]`
    ///
    /// When a [`Trainer`](crate::scheduler::Trainer) is running, prefer its
    /// setter of the same name so the live timer re-arms at the new cadence.
    pub fn set_action_delay(&mut self, delay_ms: u64) -> Result<(), ValidationError> {
        if !(MIN_ACTION_DELAY_MS..=MAX_ACTION_DELAY_MS).contains(&delay_ms) {
            return Err(ValidationError::ActionDelay(delay_ms));
        }
        self.action_delay = Duration::from_millis(delay_ms);
        Ok(())
    }

    /// Set the autonomous-training episode cap, at least 1
    pub fn set_max_episodes(&mut self, max: u32) -> Result<(), ValidationError> {
        if max < 1 {
            return Err(ValidationError::MaxEpisodes(max));
        }
        self.max_episodes = max;
        Ok(())
    }

    pub fn set_step_penalty(&mut self, penalty: f32) {
        self.rewards.step_penalty = penalty;
    }

    pub fn set_trap_penalty(&mut self, penalty: f32) {
        self.rewards.trap_penalty = penalty;
    }

    pub fn set_goal_reward(&mut self, reward: f32) {
        self.rewards.goal_reward = reward;
    }

    /// Fold the completed episode into the Q-table, metrics, and history
    ///
    /// Every-visit Monte Carlo: each step's own return updates its
    /// `(state, action)` pair via `Q <- Q + lr * (G - Q)`. Under autonomous
    /// training this also advances the episode counter, decays epsilon, and
    /// leaves auto mode the moment the episode cap is reached.
    fn finalize_episode(&mut self) {
        self.current.fill_returns(self.gamma);

        for step in self.current.steps() {
            let q = self.q.get(step.state, step.action);
            self.q
                .set(step.state, step.action, q + self.learning_rate * (step.ret - q));
        }

        let total = self.current.total_reward();
        self.metrics.record(total);
        self.history.push(self.current.clone());
        debug!(
            "episode finished: outcome={:?} steps={} total_reward={}",
            self.current.outcome(),
            self.current.steps().len(),
            total,
        );

        if self.auto_running {
            self.episodes += 1;
            self.policy.decay_epsilon();
            if self.episodes >= self.max_episodes {
                self.auto_running = false;
                info!("episode cap reached after {} episodes", self.episodes);
            }
        }
    }
}
