use crate::quaternion::Quaternion;
use crate::utils::wrap_pi;

/// Heading (yaw about Y), pitch (about X), bank (roll about Z) triple.
#[derive(Clone, Copy, Debug, Default)]
pub struct EulerAngles {
    pub heading: f32,
    pub pitch: f32,
    pub bank: f32,
}

impl EulerAngles {
    pub const IDENTITY: EulerAngles = EulerAngles { heading: 0.0, pitch: 0.0, bank: 0.0 };

    pub fn new(heading: f32, pitch: f32, bank: f32) -> EulerAngles {
        EulerAngles { heading, pitch, bank }
    }

    pub fn to_quaternion(self) -> Quaternion {
        Quaternion::from_euler_zyx(self.heading, self.pitch, self.bank)
    }

    /// Wraps all three components into `[-pi, pi]`, without changing the
    /// net orientation they describe.
    pub fn canonize(self) -> EulerAngles {
        EulerAngles {
            heading: wrap_pi(self.heading),
            pitch: wrap_pi(self.pitch),
            bank: wrap_pi(self.bank),
        }
    }
}
