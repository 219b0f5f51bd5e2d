use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{StudioError, StudioResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Fixed internal resolution of the compositing surface, in raster pixels.
///
/// The surface is decoupled from the on-screen display size: it is recreated
/// only when the aspect ratio changes, never on resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width/height as a float ratio. Zero height yields zero, not a NaN.
    pub fn ratio(self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        f64::from(self.width) / f64::from(self.height)
    }

    pub fn to_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Target aspect ratio expressed as a positive `w:h` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AspectRatio {
    pub num: u32, // width term, must be > 0
    pub den: u32, // height term, must be > 0
}

impl AspectRatio {
    /// The fixed set offered by the selection UI.
    pub const CHOICES: [AspectRatio; 5] = [
        AspectRatio { num: 9, den: 16 },
        AspectRatio { num: 3, den: 4 },
        AspectRatio { num: 1, den: 1 },
        AspectRatio { num: 4, den: 3 },
        AspectRatio { num: 16, den: 9 },
    ];

    pub fn new(num: u32, den: u32) -> StudioResult<Self> {
        if num == 0 {
            return Err(StudioError::validation("AspectRatio num must be > 0"));
        }
        if den == 0 {
            return Err(StudioError::validation("AspectRatio den must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.num, self.den)
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> StudioResult<Self> {
        let (num, den) = s
            .split_once(':')
            .ok_or_else(|| StudioError::validation(format!("aspect ratio '{s}' is not 'w:h'")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| StudioError::validation(format!("aspect ratio '{s}' is not 'w:h'")))
        };
        Self::new(parse(num)?, parse(den)?)
    }
}
