pub mod number;
pub mod scalar;
pub mod timestamp;
pub mod unit;
pub mod vector;

pub use number::{Number, ValueDomain};
pub use scalar::ScalarValue;
pub use timestamp::UtcDateTime;
pub use unit::{known_label, Unit, KNOWN_UNITS};
pub use vector::{BoundedVector, BoundedVectorBuilder};
