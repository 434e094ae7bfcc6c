// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::config::RunnerConfig;
use crate::util::RunnerName;

/// A tagged notification from the config observer, replacing the source's
/// dynamic add/update/delete listener dispatch with a single variant the
/// Lifecycle Manager can pattern-match without risking a race against a
/// worker loop reading the same runner concurrently.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    /// A new runner should be started.
    Add(RunnerConfig),
    /// An existing runner's configuration changed; its workers should be
    /// replaced.
    Update(RunnerConfig),
    /// A runner is being removed; its workers should be stopped and its
    /// resources released.
    Delete(RunnerName),
}

impl RunnerEvent {
    /// The runner this event concerns.
    pub fn runner(&self) -> &RunnerName {
        match self {
            Self::Add(config) | Self::Update(config) => &config.runner,
            Self::Delete(runner) => runner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_accessor_covers_every_variant() {
        let runner = RunnerName::new("r1");
        assert_eq!(RunnerEvent::Add(RunnerConfig::with_defaults(runner.clone())).runner(), &runner);
        assert_eq!(RunnerEvent::Update(RunnerConfig::with_defaults(runner.clone())).runner(), &runner);
        assert_eq!(RunnerEvent::Delete(runner.clone()).runner(), &runner);
    }
}
