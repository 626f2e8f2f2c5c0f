//! Hardware and renderer abstraction traits
//!
//! These traits define the interface between the flush pipeline and the
//! panel driver, the optional rotation accelerator and the GUI library.

pub mod accelerator;
pub mod display;
pub mod renderer;

pub use accelerator::{AccelAngle, AccelError, NoAccelerator, RotationAccelerator, SrmOperation};
pub use display::{DisplayDriver, DriverError};
pub use renderer::{FlushRequest, InvalidArea, Renderer, WidgetSink};
