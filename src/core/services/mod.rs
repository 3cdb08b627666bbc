pub mod account_service;
pub mod auxiliary_service;
pub mod division_service;
pub mod generator_service;
pub mod journal_service;
pub mod report_service;

pub use account_service::{build_directory, AccountFilter, AccountService};
pub use auxiliary_service::{AuxiliaryPosting, AuxiliaryService};
pub use division_service::DivisionService;
pub use generator_service::GeneratorService;
pub use journal_service::{JournalFilter, JournalService};
pub use report_service::ReportService;
