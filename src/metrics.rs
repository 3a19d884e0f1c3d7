/// Running per-episode reward history for plotting
///
/// Holds one total reward per completed episode plus a derived series where
/// entry `i` is the mean of all totals up to and including episode `i`. The
/// mean is maintained from a running sum, which produces the same values as
/// recomputing the left-to-right sum each episode.
#[derive(Debug, Default, Clone)]
pub struct RewardHistory {
    episode_rewards: Vec<f32>,
    average_rewards: Vec<f32>,
    total: f32,
}

impl RewardHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed episode's total reward and extend the average series
    pub(crate) fn record(&mut self, reward: f32) {
        self.total += reward;
        self.episode_rewards.push(reward);
        self.average_rewards.push(self.total / self.episode_rewards.len() as f32);
    }

    /// Total reward of each completed episode, in order
    pub fn episode_rewards(&self) -> &[f32] {
        &self.episode_rewards
    }

    /// Cumulative mean reward after each completed episode
    ///
    /// Always the same length as [`episode_rewards`](Self::episode_rewards).
    pub fn average_rewards(&self) -> &[f32] {
        &self.average_rewards
    }

    /// Number of completed episodes recorded
    pub fn len(&self) -> usize {
        self.episode_rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episode_rewards.is_empty()
    }
}
