pub mod day_off_type;
pub mod employee_config;
pub mod letter;
pub mod role;
