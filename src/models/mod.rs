pub mod dimensions;
pub mod dispatch_status;
pub mod element_status;
pub mod erection_status;
pub mod lifecycle;
pub mod payment_term;

pub use dimensions::Dimensions;
pub use dispatch_status::{DispatchStatus, TrackingLocation};
pub use element_status::ElementStatus;
pub use erection_status::{ApprovalState, ErectionLogStatus};
pub use lifecycle::{DispositionFlags, LifecycleState};
pub use payment_term::PaymentTerm;
