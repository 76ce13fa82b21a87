mod rolling;

pub use rolling::{RollingMoments, WindowMoments};
