use super::codes::{
    INPUT_ABS_X, INPUT_ABS_Y, INPUT_EV_ABS, INPUT_EV_KEY, INPUT_EV_REL, INPUT_KEY_MAX,
    INPUT_REL_X, INPUT_REL_Y,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    pub(crate) const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }

    pub const fn rel_code(self) -> u16 {
        match self {
            Axis::X => INPUT_REL_X,
            Axis::Y => INPUT_REL_Y,
        }
    }
}

/// Raw event as delivered by the sensor driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputEvent {
    pub event_type: u8,
    pub code: u16,
    pub value: i32,
}

/// Opaque per-binding parameters forwarded unchanged to every stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassThrough {
    pub param1: u32,
    pub param2: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassifiedEvent {
    Absolute { axis: Axis, value: i32 },
    Relative { axis: Axis, value: i32 },
    Button { code: u16, pressed: bool },
}

impl InputEvent {
    pub const fn abs(axis: Axis, value: i32) -> Self {
        Self {
            event_type: INPUT_EV_ABS,
            code: match axis {
                Axis::X => INPUT_ABS_X,
                Axis::Y => INPUT_ABS_Y,
            },
            value,
        }
    }

    pub const fn rel(axis: Axis, value: i32) -> Self {
        Self {
            event_type: INPUT_EV_REL,
            code: axis.rel_code(),
            value,
        }
    }

    pub const fn key(code: u16, pressed: bool) -> Self {
        Self {
            event_type: INPUT_EV_KEY,
            code,
            value: pressed as i32,
        }
    }

    /// Returns `None` for type/code combinations no stage understands.
    pub fn classify(&self) -> Option<ClassifiedEvent> {
        match (self.event_type, self.code) {
            (INPUT_EV_ABS, INPUT_ABS_X) => Some(ClassifiedEvent::Absolute {
                axis: Axis::X,
                value: self.value,
            }),
            (INPUT_EV_ABS, INPUT_ABS_Y) => Some(ClassifiedEvent::Absolute {
                axis: Axis::Y,
                value: self.value,
            }),
            (INPUT_EV_REL, INPUT_REL_X) => Some(ClassifiedEvent::Relative {
                axis: Axis::X,
                value: self.value,
            }),
            (INPUT_EV_REL, INPUT_REL_Y) => Some(ClassifiedEvent::Relative {
                axis: Axis::Y,
                value: self.value,
            }),
            (INPUT_EV_KEY, code) if code <= INPUT_KEY_MAX => Some(ClassifiedEvent::Button {
                code,
                pressed: self.value != 0,
            }),
            _ => None,
        }
    }
}
