pub mod base;
pub mod filter;
pub mod logging;
pub mod resample;

pub use base::*;
pub use filter::*;
pub use logging::*;
pub use resample::*;
