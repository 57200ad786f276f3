pub mod borrower;
pub mod network;
pub mod trace;
pub mod vehicle;

pub use borrower::{AddressRecord, Borrower, EmploymentRecord};
pub use network::{Associate, SocialProfile};
pub use trace::{SourceName, StepStatus, TraceRequest, TraceResult, TraceStep};
pub use vehicle::{LoanInfo, Vehicle, VehicleSighting};
