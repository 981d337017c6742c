mod style;
mod turn;

pub use style::*;
pub use turn::*;
