pub mod day_off_type_repo;
pub mod employee_config_repo;
pub mod employee_repo;
pub mod letter_repo;

pub use day_off_type_repo::DayOffTypeRepo;
pub use employee_config_repo::EmployeeConfigRepo;
pub use employee_repo::EmployeeRepo;
pub use letter_repo::{LetterRepo, LetterViewRow};
