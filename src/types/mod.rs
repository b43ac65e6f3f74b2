pub mod anomaly;
pub mod bar;
pub mod features;
pub mod tensor;

pub use anomaly::*;
pub use bar::*;
pub use features::*;
pub use tensor::*;
