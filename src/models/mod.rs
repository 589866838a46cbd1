pub mod diagnostic;
pub mod plan;
pub mod record;

pub use diagnostic::{DiagnosticInput, PhysicalState};
pub use plan::{Plan, PlanOrigin, PlanSections};
pub use record::{DiagnosticRecord, NewDiagnosticRecord};
