use platformer_engine::{InputAction, InputSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScriptAction {
    Left,
    Right,
    Up,
    Down,
}

impl ScriptAction {
    fn input_action(self) -> InputAction {
        match self {
            Self::Left => InputAction::MoveLeft,
            Self::Right => InputAction::MoveRight,
            Self::Up => InputAction::MoveUp,
            Self::Down => InputAction::MoveDown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ScriptSegment {
    pub(crate) ticks: u32,
    #[serde(default)]
    pub(crate) actions: Vec<ScriptAction>,
}

impl ScriptSegment {
    fn snapshot(&self) -> InputSnapshot {
        self.actions
            .iter()
            .fold(InputSnapshot::empty(), |snapshot, action| {
                snapshot.with_action_down(action.input_action(), true)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct InputScript {
    pub(crate) segments: Vec<ScriptSegment>,
}

impl InputScript {
    /// Walks right, hops onto the first platforms, drops back down, then walks home.
    pub(crate) fn builtin() -> Self {
        use ScriptAction::{Down, Left, Right, Up};

        let segment = |ticks, actions: &[ScriptAction]| ScriptSegment {
            ticks,
            actions: actions.to_vec(),
        };
        Self {
            segments: vec![
                segment(90, &[]),
                segment(60, &[Right]),
                segment(20, &[Right, Up]),
                segment(40, &[Right]),
                segment(10, &[]),
                segment(20, &[Up]),
                segment(60, &[]),
                segment(30, &[Down]),
                segment(80, &[Left]),
                segment(20, &[Left, Up]),
                segment(60, &[]),
            ],
        }
    }

    pub(crate) fn total_ticks(&self) -> u64 {
        self.segments
            .iter()
            .map(|segment| u64::from(segment.ticks))
            .sum()
    }

    pub(crate) fn into_player(self) -> ScriptPlayer {
        ScriptPlayer {
            has_ticks: self.total_ticks() > 0,
            script: self,
            segment: 0,
            elapsed_in_segment: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ScriptPlayer {
    script: InputScript,
    has_ticks: bool,
    segment: usize,
    elapsed_in_segment: u32,
}

impl Iterator for ScriptPlayer {
    type Item = InputSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_ticks {
            return Some(InputSnapshot::empty());
        }

        loop {
            let segment = &self.script.segments[self.segment];
            if self.elapsed_in_segment < segment.ticks {
                self.elapsed_in_segment += 1;
                return Some(segment.snapshot());
            }
            self.elapsed_in_segment = 0;
            self.segment = (self.segment + 1) % self.script.segments.len();
        }
    }
}
