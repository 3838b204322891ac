//! Per-window accumulation of zig-zag sweeps

/// Which way the current sweep walks the axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Even averages sweep forward, odd ones backward
    pub fn for_average(completed: u32) -> Self {
        if completed % 2 == 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }
}

/// What happened on a call to [`SweepState::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to a neighbouring point of the same sweep
    Moved,
    /// Hit the axis end; the sweep was folded into the cumulative sum
    SweepDone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepState {
    index: usize,
    direction: Direction,
    current: Vec<f64>,
    cumulative: Vec<f64>,
    completed: u32,
}

impl SweepState {
    /// Fresh state for an axis of `n` points
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "a sweep needs at least one point");
        Self {
            index: 0,
            direction: Direction::Forward,
            current: vec![0.0; n],
            cumulative: vec![0.0; n],
            completed: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn completed_averages(&self) -> u32 {
        self.completed
    }

    pub fn current_buffer(&self) -> &[f64] {
        &self.current
    }

    pub fn cumulative_sum(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Store the integrated lock-in reading for the current point
    pub fn record(&mut self, value: f64) {
        self.current[self.index] = value;
    }

    /// Move one point along the zig-zag. At an axis end the sweep is folded
    /// into the sum, the count goes up by one and the direction flips.
    pub fn advance(&mut self) -> Step {
        let last = self.current.len() - 1;
        match self.direction {
            Direction::Backward if self.index > 0 => {
                self.index -= 1;
                Step::Moved
            }
            Direction::Forward if self.index < last => {
                self.index += 1;
                Step::Moved
            }
            _ => {
                self.fold();
                Step::SweepDone
            }
        }
    }

    fn fold(&mut self) {
        for (sum, y) in self.cumulative.iter_mut().zip(self.current.iter_mut()) {
            *sum += *y;
            *y = 0.0;
        }
        self.completed += 1;
        self.direction = Direction::for_average(self.completed);
    }

    /// Throw away the in-progress sweep and go back to where it started
    pub fn redo(&mut self) {
        self.current.iter_mut().for_each(|y| *y = 0.0);
        self.index = match self.direction {
            Direction::Forward => 0,
            Direction::Backward => self.current.len() - 1,
        };
    }

    /// Throw away everything accumulated for this window
    pub fn restart(&mut self) {
        *self = Self::new(self.current.len());
    }

    /// What a checkpoint should persist: the sum of completed sweeps with
    /// their count, or the raw in-progress sweep when none has completed
    pub fn checkpoint_source(&self) -> (&[f64], u32) {
        if self.completed > 0 {
            (&self.cumulative, self.completed)
        } else {
            (&self.current, 0)
        }
    }
}
