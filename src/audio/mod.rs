pub mod constants;
pub mod pipeline;
pub mod resample;
pub mod wav;
